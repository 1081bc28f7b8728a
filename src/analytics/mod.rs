//! Derived, request-scoped analytics over catalog rows.
//!
//! Nothing in this module is persisted: emotion labels, distributions and
//! similarity rankings are recomputed on every read so that recalibrating
//! the underlying constants never requires a data migration.

pub mod distribution;
pub mod emotion;
pub mod similarity;

pub use distribution::{distribution, DistributionEntry};
pub use emotion::{classify, EmotionLabel};
pub use similarity::{rank_similar, FeatureVector, DEFAULT_SIMILAR_LIMIT, MAX_SIMILAR_LIMIT};
