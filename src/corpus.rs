use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use tracing::info;
use walkdir::WalkDir;

use crate::embedding::SentenceBatch;
use crate::error::SifError;
use crate::wordvec::{Vocabulary, WordWeights};

/// Load a corpus as one sentence per nonempty line.
///
/// `path` is either a text file or a directory; directories are walked in
/// file-name order and every `.txt` file contributes its lines.
pub fn load_sentences(path: &Path) -> Result<Vec<String>> {
    let mut sentences = Vec::new();

    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| {
                format!("Failed to walk corpus directory: {}", path.display())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            read_sentence_lines(entry.path(), &mut sentences)?;
        }
    } else {
        read_sentence_lines(path, &mut sentences)?;
    }

    if sentences.is_empty() {
        bail!("No sentences found in {}", path.display());
    }

    info!(
        sentences = sentences.len(),
        path = %path.display(),
        "loaded corpus"
    );
    Ok(sentences)
}

fn read_sentence_lines(path: &Path, sentences: &mut Vec<String>) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;

    for line in text.lines() {
        let line = line.trim();
        if !line.is_empty() {
            sentences.push(line.to_string());
        }
    }
    Ok(())
}

/// SHA-256 over the sentence lines, for recording which corpus a fit saw.
pub fn corpus_digest(sentences: &[String]) -> String {
    let mut hasher = Sha256::new();
    for sentence in sentences {
        hasher.update(sentence.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Turns raw sentences into the padded index/weight matrices the embedding
/// stage consumes.
///
/// Tokenization is whitespace splitting plus lowercasing. Tokens missing
/// from the vocabulary are dropped; a sentence left with no tokens is an
/// error, since its average would be undefined.
pub struct SentenceIndexer<'a> {
    vocab: &'a Vocabulary,
    weights: &'a WordWeights,
}

impl<'a> SentenceIndexer<'a> {
    pub fn new(vocab: &'a Vocabulary, weights: &'a WordWeights) -> Self {
        Self { vocab, weights }
    }

    /// Index a corpus into a rectangular batch, padding short sentences
    /// with index 0 and weight 0.0.
    pub fn index(&self, sentences: &[String]) -> Result<SentenceBatch, SifError> {
        if sentences.is_empty() {
            return Err(SifError::InvalidInput(
                "cannot index an empty corpus".to_string(),
            ));
        }

        let mut rows: Vec<(Vec<usize>, Vec<f32>)> = Vec::with_capacity(sentences.len());
        for (i, sentence) in sentences.iter().enumerate() {
            let mut indices = Vec::new();
            let mut weights = Vec::new();

            for token in sentence.split_whitespace() {
                let token = token.to_lowercase();
                if let Some(index) = self.vocab.index_of(&token) {
                    indices.push(index);
                    weights.push(self.weights.weight(&token));
                }
            }

            if indices.is_empty() {
                return Err(SifError::InvalidInput(format!(
                    "sentence {} has no in-vocabulary tokens: {:?}",
                    i, sentence
                )));
            }
            rows.push((indices, weights));
        }

        let width = rows.iter().map(|(indices, _)| indices.len()).max().unwrap_or(0);
        let mut index_matrix = Vec::with_capacity(rows.len());
        let mut weight_matrix = Vec::with_capacity(rows.len());
        for (mut indices, mut weights) in rows {
            indices.resize(width, 0);
            weights.resize(width, 0.0);
            index_matrix.push(indices);
            weight_matrix.push(weights);
        }

        SentenceBatch::new(index_matrix, weight_matrix)
    }
}
