//! Genre grouping library: collapses streaming-service genre tags into a
//! small set of artist groups.

pub mod absorb;
pub mod classifier;
pub mod config;
pub mod index;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod rescue;
pub mod safety;
pub mod scoring;

pub use classifier::{classify, Classification, GenreClassifier};
pub use config::{GroupingConfig, MergeRule, MergeStrategy};
pub use models::{parse_artists, Anomaly, Artist, ClassificationStats, GenreIndex, CATEGORY_MISSING, MISC};
