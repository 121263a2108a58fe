use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

/// Default value of the SIF parameter `a` in weight = a / (a + p(w)).
pub const DEFAULT_SIF_PARAM: f32 = 1e-3;

/// Per-word SIF weights derived from corpus frequencies.
///
/// A word with relative frequency p gets weight a / (a + p), so frequent
/// words contribute less to a sentence average. Words without a recorded
/// frequency weigh 1.0.
#[derive(Debug, Clone)]
pub struct WordWeights {
    weights: HashMap<String, f32>,
}

impl WordWeights {
    /// Weights from raw occurrence counts.
    pub fn from_counts(counts: &[(String, u64)], param: f32) -> Self {
        // A non-positive parameter makes no sense here; fall back toward
        // unweighted averaging.
        let param = if param > 0.0 { param } else { 1.0 };

        let total: u64 = counts.iter().map(|(_, count)| count).sum();
        if total == 0 {
            return Self {
                weights: HashMap::new(),
            };
        }

        let param = param as f64;
        let total = total as f64;
        let weights = counts
            .iter()
            .map(|(word, count)| {
                let frequency = *count as f64 / total;
                (word.clone(), (param / (param + frequency)) as f32)
            })
            .collect();

        Self { weights }
    }

    /// Parse a frequency file with one "word count" pair per line.
    /// Lines that do not fit the two-field shape are skipped.
    pub fn from_frequency_file(path: &Path, param: f32) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read word frequencies: {}", path.display()))?;

        let mut counts = Vec::new();
        let mut skipped = 0usize;

        for line in text.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => {}
                [word, count] => match count.parse::<u64>() {
                    Ok(count) => counts.push((word.to_lowercase(), count)),
                    Err(_) => skipped += 1,
                },
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(
                skipped = skipped,
                path = %path.display(),
                "skipped malformed frequency lines"
            );
        }

        Ok(Self::from_counts(&counts, param))
    }

    /// Weights that leave every word at 1.0, for unweighted averaging.
    pub fn uniform() -> Self {
        Self {
            weights: HashMap::new(),
        }
    }

    /// Weight of `word`, or 1.0 when no frequency was recorded.
    pub fn weight(&self, word: &str) -> f32 {
        self.weights.get(word).copied().unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
