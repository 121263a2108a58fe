use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::artifact::ComponentStore;
use crate::embedding::{
    principal_components, remove_projection, weighted_average, SentenceBatch, DEFAULT_DAMPING,
    DEFAULT_MAX_ITERS, DEFAULT_SEED,
};
use crate::error::SifError;
use crate::wordvec::WordVectorTable;

/// Knobs shared by the fit and embed pipelines.
#[derive(Debug, Clone, Copy)]
pub struct SifParams {
    /// Number of principal components to fit and remove. 0 disables both.
    pub rmpc: usize,
    /// Scale applied to stored components before removal.
    pub damping: f32,
}

impl Default for SifParams {
    fn default() -> Self {
        Self {
            rmpc: 1,
            damping: DEFAULT_DAMPING,
        }
    }
}

/// Embed pipeline output: the finished rows plus how many stored
/// components were subtracted from them.
#[derive(Debug)]
pub struct EmbedResult {
    pub embeddings: Vec<Vec<f32>>,
    pub components_removed: usize,
}

/// Sidecar metadata written next to a fitted artifact.
#[derive(Debug, Serialize, Deserialize)]
pub struct FitManifest {
    pub created_at: String,
    pub generator: String,
    pub tag: String,
    pub components: usize,
    pub dim: usize,
    pub sentences: usize,
    pub corpus_digest: String,
}

impl FitManifest {
    pub fn new(
        tag: &str,
        components: usize,
        dim: usize,
        sentences: usize,
        corpus_digest: String,
    ) -> Self {
        Self {
            created_at: Utc::now().to_rfc3339(),
            generator: format!("sentsif v{}", env!("CARGO_PKG_VERSION")),
            tag: tag.to_string(),
            components,
            dim,
            sentences,
            corpus_digest,
        }
    }
}

/// Write a fit manifest as JSON next to its artifact.
pub fn write_fit_manifest(artifact_path: &Path, manifest: &FitManifest) -> Result<PathBuf> {
    let mut file_name = artifact_path
        .file_name()
        .context("Artifact path has no file name")?
        .to_os_string();
    file_name.push(".json");
    let path = artifact_path.with_file_name(file_name);

    let json = serde_json::to_string_pretty(manifest).context("Failed to serialize manifest")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
    Ok(path)
}

/// Fit pipeline: average the batch, estimate its top components, persist
/// them under `tag`. Returns the artifact path, or None when `params.rmpc`
/// is 0 and there is nothing to fit.
pub fn fit_components(
    table: &WordVectorTable,
    batch: &SentenceBatch,
    params: &SifParams,
    store: &ComponentStore,
    tag: &str,
) -> Result<Option<PathBuf>, SifError> {
    if params.rmpc == 0 {
        return Ok(None);
    }

    let embeddings = weighted_average(table, batch)?;
    let components = principal_components(&embeddings, params.rmpc, DEFAULT_MAX_ITERS, DEFAULT_SEED)?;
    let path = store.save(&components, tag)?;
    Ok(Some(path))
}

/// Embed pipeline: average the batch and, when `params.rmpc` is nonzero,
/// subtract the damped projection onto the components stored under `tag`.
/// The reported removal count comes from the artifact, not `params.rmpc`.
pub fn embed_sentences(
    table: &WordVectorTable,
    batch: &SentenceBatch,
    params: &SifParams,
    store: &ComponentStore,
    tag: &str,
) -> Result<EmbedResult, SifError> {
    let embeddings = weighted_average(table, batch)?;
    if params.rmpc == 0 {
        return Ok(EmbedResult {
            embeddings,
            components_removed: 0,
        });
    }

    let components = store.load(tag)?;
    if components.dim() != table.dim() {
        return Err(SifError::CorruptArtifact {
            path: store.artifact_path(tag).display().to_string(),
            reason: format!(
                "component dimension {} does not match word vectors ({})",
                components.dim(),
                table.dim()
            ),
        });
    }

    // Removal honors whatever the artifact holds, not params.rmpc.
    let cleaned = remove_projection(&embeddings, &components, params.damping)?;
    Ok(EmbedResult {
        embeddings: cleaned,
        components_removed: components.count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::FIT_TAG_SUFFIX;
    use crate::embedding::PrincipalComponents;

    fn table() -> WordVectorTable {
        WordVectorTable::from_rows(vec![
            vec![4.0, 1.0],
            vec![5.0, -1.0],
            vec![4.5, 0.5],
            vec![5.5, -0.5],
        ])
        .unwrap()
    }

    fn one_word_sentences(n: usize) -> SentenceBatch {
        let indices: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        let weights = vec![vec![1.0]; n];
        SentenceBatch::new(indices, weights).unwrap()
    }

    #[test]
    fn test_fit_then_embed_removes_common_direction() {
        let dir = tempfile::tempdir().unwrap();
        let store = ComponentStore::new(dir.path());
        let table = table();
        let batch = one_word_sentences(4);
        let params = SifParams::default();

        let artifact = fit_components(&table, &batch, &params, &store, "corpus")
            .unwrap()
            .unwrap();
        assert!(artifact.exists());

        let plain = embed_sentences(
            &table,
            &batch,
            &SifParams { rmpc: 0, ..params },
            &store,
            "unused",
        )
        .unwrap();
        let cleaned = embed_sentences(
            &table,
            &batch,
            &params,
            &store,
            &format!("corpus{}", FIT_TAG_SUFFIX),
        )
        .unwrap();

        assert_eq!(plain.components_removed, 0);
        assert_eq!(cleaned.components_removed, 1);
        let norm = |rows: &[Vec<f32>]| -> f32 {
            rows.iter()
                .flat_map(|row| row.iter())
                .map(|v| v * v)
                .sum::<f32>()
        };
        assert!(norm(&cleaned.embeddings) < norm(&plain.embeddings));
    }

    #[test]
    fn test_rmpc_zero_skips_fit_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ComponentStore::new(dir.path());
        let table = table();
        let batch = one_word_sentences(3);
        let params = SifParams {
            rmpc: 0,
            damping: DEFAULT_DAMPING,
        };

        let artifact = fit_components(&table, &batch, &params, &store, "corpus").unwrap();
        assert!(artifact.is_none());

        let embedded = embed_sentences(&table, &batch, &params, &store, "corpus").unwrap();
        let averaged = weighted_average(&table, &batch).unwrap();
        assert_eq!(embedded.embeddings, averaged);
        assert_eq!(embedded.components_removed, 0);
    }

    #[test]
    fn test_embed_without_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ComponentStore::new(dir.path());
        let table = table();
        let batch = one_word_sentences(2);

        let err =
            embed_sentences(&table, &batch, &SifParams::default(), &store, "missing").unwrap_err();

        assert!(matches!(err, SifError::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_embed_rejects_mismatched_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ComponentStore::new(dir.path());
        let wrong_dim = PrincipalComponents::new(vec![vec![1.0, 0.0, 0.0]]).unwrap();
        store.save(&wrong_dim, "corpus").unwrap();

        let table = table();
        let batch = one_word_sentences(2);
        let err = embed_sentences(
            &table,
            &batch,
            &SifParams::default(),
            &store,
            &format!("corpus{}", FIT_TAG_SUFFIX),
        )
        .unwrap_err();

        assert!(matches!(err, SifError::CorruptArtifact { .. }));
    }

    #[test]
    fn test_removal_uses_every_stored_component() {
        let dir = tempfile::tempdir().unwrap();
        let store = ComponentStore::new(dir.path());
        let stored = PrincipalComponents::new(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        store.save(&stored, "corpus").unwrap();

        let table = table();
        let batch = one_word_sentences(1);
        // rmpc understates the artifact; removal still subtracts both rows.
        let result = embed_sentences(
            &table,
            &batch,
            &SifParams {
                rmpc: 1,
                damping: 0.8,
            },
            &store,
            &format!("corpus{}", FIT_TAG_SUFFIX),
        )
        .unwrap();

        assert_eq!(result.components_removed, 2);
        // Both axes damped: x - 0.8^2 * x = 0.36 * x on row [4.0, 1.0].
        let row = &result.embeddings[0];
        assert!((row[0] - 1.44).abs() < 1e-5);
        assert!((row[1] - 0.36).abs() < 1e-5);
    }

    #[test]
    fn test_manifest_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("corpus_lawinsider_full");
        std::fs::write(&artifact, b"").unwrap();

        let manifest = FitManifest::new("corpus", 1, 2, 4, "abc123".to_string());
        let path = write_fit_manifest(&artifact, &manifest).unwrap();

        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("corpus_lawinsider_full.json")
        );
        let parsed: FitManifest =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.tag, "corpus");
        assert_eq!(parsed.components, 1);
        assert_eq!(parsed.dim, 2);
        assert_eq!(parsed.sentences, 4);
        assert_eq!(parsed.corpus_digest, "abc123");
    }
}
