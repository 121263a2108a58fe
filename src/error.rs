use thiserror::Error;

#[derive(Error, Debug)]
pub enum SifError {
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Component artifact not found: {path}")]
    ArtifactNotFound { path: String },

    #[error("Corrupt component artifact {path}: {reason}")]
    CorruptArtifact { path: String, reason: String },

    #[error("Artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
