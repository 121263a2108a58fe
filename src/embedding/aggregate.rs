use tracing::debug;

use crate::embedding::types::SentenceBatch;
use crate::error::SifError;
use crate::wordvec::WordVectorTable;

/// Compute the weighted-average embedding of every sentence in the batch.
///
/// Row i of the result is the weight row of sentence i dotted with the word
/// vectors its index row gathers, divided by the number of nonzero-weight
/// slots. Padding slots (weight 0.0) drop out of the sum, but their indices
/// are still bounds-checked against the table.
pub fn weighted_average(
    table: &WordVectorTable,
    batch: &SentenceBatch,
) -> Result<Vec<Vec<f32>>, SifError> {
    let dim = table.dim();
    let mut embeddings = Vec::with_capacity(batch.len());

    for (row, (indices, weights)) in batch.indices().iter().zip(batch.weights()).enumerate() {
        let mut sum = vec![0.0f32; dim];
        let mut active = 0usize;

        for (&index, &weight) in indices.iter().zip(weights) {
            let vector = table.row(index).ok_or_else(|| {
                SifError::ShapeMismatch(format!(
                    "sentence {}: word index {} out of bounds for a table of {} words",
                    row,
                    index,
                    table.len()
                ))
            })?;

            if weight != 0.0 {
                active += 1;
            }
            for (acc, &value) in sum.iter_mut().zip(vector) {
                *acc += weight * value;
            }
        }

        if active == 0 {
            return Err(SifError::InvalidInput(format!(
                "sentence {} has no nonzero-weight tokens",
                row
            )));
        }

        // The divisor is the nonzero-weight token count, not the weight sum.
        // Scores downstream were calibrated against this normalization.
        let divisor = active as f32;
        for value in &mut sum {
            *value /= divisor;
        }

        embeddings.push(sum);
    }

    debug!(
        sentences = embeddings.len(),
        dim = dim,
        "aggregated weighted-average embeddings"
    );
    Ok(embeddings)
}
