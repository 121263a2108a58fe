use crate::embedding::math::dot;
use crate::embedding::types::PrincipalComponents;
use crate::error::SifError;

/// Reference damping factor applied to stored components before removal.
pub const DEFAULT_DAMPING: f32 = 0.8;

/// Subtract each embedding's projection onto the damped component rows.
///
/// Component rows are scaled by `damping` at every call, so one persisted
/// set can be reused under different damping without refitting. For a single
/// component this is the rank-1 update x - (x . p) p. For several it is the
/// one-shot subspace projection X - (X P^T) P, not a sequential
/// per-component subtraction; the two differ when rows are not orthonormal.
pub fn remove_projection(
    embeddings: &[Vec<f32>],
    components: &PrincipalComponents,
    damping: f32,
) -> Result<Vec<Vec<f32>>, SifError> {
    let dim = components.dim();
    for (i, row) in embeddings.iter().enumerate() {
        if row.len() != dim {
            return Err(SifError::ShapeMismatch(format!(
                "embedding {} has dimension {}, component set expects {}",
                i,
                row.len(),
                dim
            )));
        }
    }

    let damped: Vec<Vec<f32>> = components
        .rows()
        .iter()
        .map(|row| row.iter().map(|&value| value * damping).collect())
        .collect();

    let mut output = Vec::with_capacity(embeddings.len());
    for row in embeddings {
        // One coefficient per damped component, all taken from the
        // original row before any subtraction.
        let scores: Vec<f32> = damped.iter().map(|component| dot(row, component)).collect();

        let mut out = row.clone();
        for (score, component) in scores.iter().zip(&damped) {
            for (value, &p) in out.iter_mut().zip(component) {
                *value -= score * p;
            }
        }
        output.push(out);
    }

    Ok(output)
}
