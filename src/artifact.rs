use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::embedding::PrincipalComponents;
use crate::error::SifError;

/// Suffix appended to every tag at save time. Load takes the caller's tag
/// verbatim, so readers pass the suffixed name that a fit run produced.
pub const FIT_TAG_SUFFIX: &str = "_lawinsider_full";

/// Default directory for component artifacts, relative to the working
/// directory. Kept as a sibling so separate corpora runs share one store.
pub const DEFAULT_COMPONENT_DIR: &str = "../first_principal_component";

const ARTIFACT_MAGIC: [u8; 4] = *b"FPC1";
const HEADER_LEN: usize = 12;

/// Directory-backed store for fitted principal components.
///
/// The on-disk format is a 4-byte magic, component count and dimension as
/// little-endian u32, then the rows as little-endian f32 in row-major
/// order. Loading an artifact reproduces the saved rows bit for bit.
pub struct ComponentStore {
    base_dir: PathBuf,
}

impl ComponentStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Path of the artifact a given tag resolves to at load time.
    pub fn artifact_path(&self, tag: &str) -> PathBuf {
        self.base_dir.join(tag)
    }

    /// Persist a component set under `tag` plus the fixed suffix.
    /// Returns the path written.
    pub fn save(&self, components: &PrincipalComponents, tag: &str) -> Result<PathBuf, SifError> {
        let file_name = format!("{}{}", tag, FIT_TAG_SUFFIX);
        let path = self.base_dir.join(&file_name);

        fs::create_dir_all(&self.base_dir)?;
        fs::write(&path, encode(components))?;

        info!(
            path = %path.display(),
            npc = components.count(),
            dim = components.dim(),
            "saved component artifact"
        );
        Ok(path)
    }

    /// Load the component set stored under `tag`, taken verbatim.
    pub fn load(&self, tag: &str) -> Result<PrincipalComponents, SifError> {
        let path = self.artifact_path(tag);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SifError::ArtifactNotFound {
                    path: path.display().to_string(),
                });
            }
            Err(err) => return Err(SifError::Io(err)),
        };

        let components = decode(&bytes, &path)?;
        debug!(
            path = %path.display(),
            npc = components.count(),
            dim = components.dim(),
            "loaded component artifact"
        );
        Ok(components)
    }
}

fn encode(components: &PrincipalComponents) -> Vec<u8> {
    let npc = components.count() as u32;
    let dim = components.dim() as u32;

    let mut data = Vec::with_capacity(HEADER_LEN + components.count() * components.dim() * 4);
    data.extend_from_slice(&ARTIFACT_MAGIC);
    data.extend_from_slice(&npc.to_le_bytes());
    data.extend_from_slice(&dim.to_le_bytes());
    for row in components.rows() {
        data.extend(row.iter().flat_map(|f| f.to_le_bytes()));
    }
    data
}

fn decode(bytes: &[u8], path: &Path) -> Result<PrincipalComponents, SifError> {
    let corrupt = |reason: String| SifError::CorruptArtifact {
        path: path.display().to_string(),
        reason,
    };

    if bytes.len() < HEADER_LEN {
        return Err(corrupt(format!("header truncated at {} bytes", bytes.len())));
    }
    if bytes[0..4] != ARTIFACT_MAGIC {
        return Err(corrupt("bad magic bytes".to_string()));
    }

    let npc = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let dim = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    if npc == 0 || dim == 0 {
        return Err(corrupt(format!("empty shape {}x{}", npc, dim)));
    }

    let payload = npc
        .checked_mul(dim)
        .and_then(|cells| cells.checked_mul(4))
        .ok_or_else(|| corrupt(format!("shape {}x{} out of range", npc, dim)))?;
    if bytes.len() != HEADER_LEN + payload {
        return Err(corrupt(format!(
            "expected {} bytes for shape {}x{}, found {}",
            HEADER_LEN + payload,
            npc,
            dim,
            bytes.len()
        )));
    }

    let rows: Vec<Vec<f32>> = bytes[HEADER_LEN..]
        .chunks_exact(dim * 4)
        .map(|row| {
            row.chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect()
        })
        .collect();

    PrincipalComponents::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PrincipalComponents {
        PrincipalComponents::new(vec![vec![0.1, -0.2, 0.3], vec![-0.4, 0.5, -0.6]]).unwrap()
    }

    #[test]
    fn test_round_trip_is_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = ComponentStore::new(dir.path());

        let saved = sample();
        store.save(&saved, "contracts").unwrap();
        let loaded = store.load(&format!("contracts{}", FIT_TAG_SUFFIX)).unwrap();

        assert_eq!(loaded.count(), saved.count());
        assert_eq!(loaded.dim(), saved.dim());
        for (a, b) in saved.rows().iter().zip(loaded.rows()) {
            for (x, y) in a.iter().zip(b) {
                assert_eq!(x.to_bits(), y.to_bits());
            }
        }
    }

    #[test]
    fn test_save_appends_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let store = ComponentStore::new(dir.path());

        let path = store.save(&sample(), "contracts").unwrap();

        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("contracts_lawinsider_full")
        );
        assert!(path.exists());
    }

    #[test]
    fn test_save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("store").join("components");
        let store = ComponentStore::new(&base);

        let path = store.save(&sample(), "contracts").unwrap();

        assert!(path.exists());
        let loaded = store.load(&format!("contracts{}", FIT_TAG_SUFFIX)).unwrap();
        assert_eq!(loaded.rows(), sample().rows());
    }

    #[test]
    fn test_load_uses_tag_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = ComponentStore::new(dir.path());
        store.save(&sample(), "contracts").unwrap();

        // The unsuffixed tag names a file save never wrote.
        let err = store.load("contracts").unwrap_err();

        assert!(matches!(err, SifError::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ComponentStore::new(dir.path());

        let err = store.load("nothing_here").unwrap_err();

        assert!(matches!(err, SifError::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_corrupt_artifacts_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ComponentStore::new(dir.path());

        fs::write(dir.path().join("short"), b"FP").unwrap();
        assert!(matches!(
            store.load("short").unwrap_err(),
            SifError::CorruptArtifact { .. }
        ));

        fs::write(dir.path().join("badmagic"), vec![0u8; 16]).unwrap();
        assert!(matches!(
            store.load("badmagic").unwrap_err(),
            SifError::CorruptArtifact { .. }
        ));

        let path = store.save(&sample(), "truncated").unwrap();
        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() - 3);
        fs::write(&path, bytes).unwrap();
        assert!(matches!(
            store.load(&format!("truncated{}", FIT_TAG_SUFFIX)).unwrap_err(),
            SifError::CorruptArtifact { .. }
        ));
    }
}
