use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::error::SifError;

/// Word-to-row mapping for a [`WordVectorTable`].
///
/// Lookups are exact; the loader folds words to lowercase, so callers
/// lowercase tokens before lookup.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary assigning sequential row indices.
    pub fn from_words(words: &[&str]) -> Self {
        let index = words
            .iter()
            .enumerate()
            .map(|(i, word)| (word.to_string(), i))
            .collect();
        Self { index }
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Dense word-vector table, one row per word, stored row-major.
#[derive(Debug, Clone)]
pub struct WordVectorTable {
    values: Vec<f32>,
    dim: usize,
}

impl WordVectorTable {
    /// Build a table from per-word rows. Fails on an empty table or rows of
    /// unequal dimension.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, SifError> {
        let dim = match rows.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => {
                return Err(SifError::InvalidInput(
                    "word-vector table must contain at least one nonempty row".to_string(),
                ))
            }
        };

        let mut values = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(SifError::ShapeMismatch(format!(
                    "word {} has dimension {}, expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
            values.extend_from_slice(row);
        }

        Ok(Self { values, dim })
    }

    /// Vector dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Vector of the word at `index`, or None when out of bounds.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.dim)?;
        let end = start.checked_add(self.dim)?;
        self.values.get(start..end)
    }
}

/// Load a GloVe-style text file: one word per line followed by its vector
/// values, whitespace-separated. Words are folded to lowercase; when a word
/// repeats, the last occurrence wins.
pub fn load_word_vectors(path: &Path) -> Result<(Vocabulary, WordVectorTable)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read word vectors: {}", path.display()))?;

    let mut index = HashMap::new();
    let mut values = Vec::new();
    let mut dim = 0usize;
    let mut row = 0usize;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else { continue };

        let vector: Vec<f32> = parts
            .map(|value| value.parse::<f32>())
            .collect::<Result<_, _>>()
            .with_context(|| {
                format!(
                    "Malformed vector value on line {} of {}",
                    line_no + 1,
                    path.display()
                )
            })?;

        if vector.is_empty() {
            bail!(
                "Line {} of {} has a word but no vector values",
                line_no + 1,
                path.display()
            );
        }
        if dim == 0 {
            dim = vector.len();
        } else if vector.len() != dim {
            bail!(
                "Inconsistent dimension on line {} of {}: {} values, expected {}",
                line_no + 1,
                path.display(),
                vector.len(),
                dim
            );
        }

        values.extend(vector);
        index.insert(word.to_lowercase(), row);
        row += 1;
    }

    if values.is_empty() {
        bail!("No word vectors found in {}", path.display());
    }

    info!(
        words = row,
        dim = dim,
        path = %path.display(),
        "loaded word vectors"
    );
    Ok((Vocabulary { index }, WordVectorTable { values, dim }))
}
