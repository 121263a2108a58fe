// Public API exports
pub mod artifact;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod wordvec;

// Re-export main types for convenience
pub use error::SifError;

pub use embedding::{
    principal_components, remove_projection, weighted_average, PrincipalComponents, SentenceBatch,
    DEFAULT_DAMPING, DEFAULT_MAX_ITERS, DEFAULT_SEED,
};

pub use artifact::{ComponentStore, DEFAULT_COMPONENT_DIR, FIT_TAG_SUFFIX};

pub use wordvec::{load_word_vectors, Vocabulary, WordVectorTable, WordWeights, DEFAULT_SIF_PARAM};

pub use corpus::{corpus_digest, load_sentences, SentenceIndexer};

pub use pipeline::{
    embed_sentences, fit_components, write_fit_manifest, EmbedResult, FitManifest, SifParams,
};
