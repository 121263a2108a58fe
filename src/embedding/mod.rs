mod aggregate;
mod math;
mod pc;
mod removal;
mod types;


pub use aggregate::weighted_average;
pub use pc::{principal_components, DEFAULT_MAX_ITERS, DEFAULT_SEED};
pub use removal::{remove_projection, DEFAULT_DAMPING};
pub use types::{PrincipalComponents, SentenceBatch};
