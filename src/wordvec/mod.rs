mod table;
mod weights;


pub use table::{load_word_vectors, Vocabulary, WordVectorTable};
pub use weights::{WordWeights, DEFAULT_SIF_PARAM};
