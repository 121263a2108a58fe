use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::embedding::math::{dot, l2_norm};
use crate::embedding::types::PrincipalComponents;
use crate::error::SifError;

/// Default RNG seed for component estimation. Fixed so repeated fits over
/// the same batch produce the same directions.
pub const DEFAULT_SEED: u64 = 0;

/// Default cap on power-iteration rounds per component.
pub const DEFAULT_MAX_ITERS: usize = 100;

/// Change in direction between rounds below which iteration stops.
const CONVERGENCE_EPS: f32 = 1e-6;

/// Norms at or below this are treated as zero.
const ZERO_NORM_EPS: f32 = 1e-12;

/// Estimate the top `npc` principal directions of an embedding batch by
/// seeded power iteration with deflation.
///
/// The batch is taken as-is: rows are not mean-centered, so the first
/// component of typical sentence embeddings absorbs the common-direction
/// bias that removal is meant to cancel. Each component runs at most
/// `max_iters` matrix products and stops early once its direction settles.
/// Output rows are unit-norm and ordered by descending singular value.
pub fn principal_components(
    embeddings: &[Vec<f32>],
    npc: usize,
    max_iters: usize,
    seed: u64,
) -> Result<PrincipalComponents, SifError> {
    let n = embeddings.len();
    let dim = embeddings.first().map(|row| row.len()).unwrap_or(0);

    for (i, row) in embeddings.iter().enumerate() {
        if row.len() != dim {
            return Err(SifError::ShapeMismatch(format!(
                "embedding {} has dimension {}, expected {}",
                i,
                row.len(),
                dim
            )));
        }
    }

    let limit = n.min(dim);
    if npc == 0 || npc > limit {
        return Err(SifError::InvalidParameter(format!(
            "npc {} outside valid range 1..={} for a {}x{} batch",
            npc, limit, n, dim
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut found: Vec<(f32, Vec<f32>)> = Vec::with_capacity(npc);

    for _ in 0..npc {
        let mut direction = random_unit_vector(&mut rng, dim);

        // Orthogonalize the start against components already found.
        for (_, prev) in &found {
            let overlap = dot(&direction, prev);
            for (value, &p) in direction.iter_mut().zip(prev) {
                *value -= overlap * p;
            }
        }
        let norm = l2_norm(&direction);
        if norm > ZERO_NORM_EPS {
            for value in &mut direction {
                *value /= norm;
            }
        }

        for _ in 0..max_iters {
            // One power step on the uncentered Gram matrix: next = X^T (X v).
            let mut next = vec![0.0f32; dim];
            for row in embeddings {
                let score = dot(row, &direction);
                for (acc, &value) in next.iter_mut().zip(row) {
                    *acc += score * value;
                }
            }

            // Deflate against components already found so this direction
            // converges to the largest remaining singular direction.
            for (_, prev) in &found {
                let overlap = dot(&next, prev);
                for (value, &p) in next.iter_mut().zip(prev) {
                    *value -= overlap * p;
                }
            }

            let norm = l2_norm(&next);
            if norm <= ZERO_NORM_EPS {
                break; // zero-variance residual: keep the current direction
            }
            for value in &mut next {
                *value /= norm;
            }

            let moved = 1.0 - dot(&next, &direction).abs();
            direction = next;
            if moved <= CONVERGENCE_EPS {
                break;
            }
        }

        let sigma = singular_value(embeddings, &direction);
        found.push((sigma, direction));
    }

    // Deflation already tends to yield descending order, but ties and slow
    // convergence can swap neighbors. Order explicitly.
    found.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    debug!(npc = npc, dim = dim, "estimated principal components");
    PrincipalComponents::new(found.into_iter().map(|(_, direction)| direction).collect())
}

/// ||X v|| for a unit direction v: the singular value along v.
fn singular_value(embeddings: &[Vec<f32>], direction: &[f32]) -> f32 {
    let mut sum = 0.0;
    for row in embeddings {
        let score = dot(row, direction);
        sum += score * score;
    }
    sum.sqrt()
}

fn random_unit_vector(rng: &mut ChaCha8Rng, dim: usize) -> Vec<f32> {
    let mut v: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect();
    let norm = l2_norm(&v);
    if norm <= ZERO_NORM_EPS {
        v.fill(0.0);
        v[0] = 1.0;
        return v;
    }
    for value in &mut v {
        *value /= norm;
    }
    v
}
