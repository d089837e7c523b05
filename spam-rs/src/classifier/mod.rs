//! Text classification module
//!
//! TF-IDF feature extraction feeding a multinomial naive Bayes classifier,
//! wrapped in a pipeline that is trained once and persisted as one artifact.

pub mod features;
pub mod naive_bayes;
pub mod pipeline;
pub mod types;

pub use features::{FeatureExtractor, FeatureSettings, TermStats, Vocabulary};
pub use naive_bayes::{ClassModel, MultinomialNb, DEFAULT_SMOOTHING};
pub use pipeline::{TrainedPipeline, MODEL_FORMAT_VERSION};
pub use types::*;
