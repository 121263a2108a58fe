use crate::error::SifError;

/// A batch of sentences encoded as parallel index and weight matrices.
///
/// Both matrices have one row per sentence and one column per token slot.
/// Cell (i, j) of the index matrix addresses a row of the word-vector table;
/// the matching weight cell carries that token's weight. Short sentences are
/// padded with index 0 and weight 0.0, so padding drops out of every sum.
#[derive(Debug, Clone)]
pub struct SentenceBatch {
    indices: Vec<Vec<usize>>,
    weights: Vec<Vec<f32>>,
}

impl SentenceBatch {
    /// Build a batch from parallel matrices. Fails unless both are
    /// rectangular and agree in shape.
    pub fn new(indices: Vec<Vec<usize>>, weights: Vec<Vec<f32>>) -> Result<Self, SifError> {
        if indices.len() != weights.len() {
            return Err(SifError::ShapeMismatch(format!(
                "index matrix has {} rows, weight matrix has {}",
                indices.len(),
                weights.len()
            )));
        }

        let width = indices.first().map(|row| row.len()).unwrap_or(0);
        for (i, (index_row, weight_row)) in indices.iter().zip(&weights).enumerate() {
            if index_row.len() != width || weight_row.len() != width {
                return Err(SifError::ShapeMismatch(format!(
                    "sentence {}: {} indices and {} weights, expected {} of each",
                    i,
                    index_row.len(),
                    weight_row.len(),
                    width
                )));
            }
        }

        Ok(Self { indices, weights })
    }

    /// Number of sentences in the batch.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of token slots per sentence (padded width).
    pub fn width(&self) -> usize {
        self.indices.first().map(|row| row.len()).unwrap_or(0)
    }

    pub fn indices(&self) -> &[Vec<usize>] {
        &self.indices
    }

    pub fn weights(&self) -> &[Vec<f32>] {
        &self.weights
    }
}

/// Principal directions of an embedding batch, one row per component,
/// ordered by descending singular value.
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalComponents {
    rows: Vec<Vec<f32>>,
}

impl PrincipalComponents {
    /// Wrap raw component rows. Fails on an empty set or ragged rows.
    pub fn new(rows: Vec<Vec<f32>>) -> Result<Self, SifError> {
        let dim = match rows.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => {
                return Err(SifError::InvalidInput(
                    "component set must contain at least one nonempty row".to_string(),
                ))
            }
        };

        for (c, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(SifError::ShapeMismatch(format!(
                    "component {} has dimension {}, expected {}",
                    c,
                    row.len(),
                    dim
                )));
            }
        }

        Ok(Self { rows })
    }

    /// Number of components.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Dimensionality of each component.
    pub fn dim(&self) -> usize {
        self.rows.first().map(|row| row.len()).unwrap_or(0)
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }
}
