//! Training module
//!
//! Dataset loading, the seeded train/test split, evaluation and the trainer.

pub mod dataset;
pub mod metrics;
pub mod trainer;

pub use dataset::{load_dataset, parse_dataset, train_test_split};
pub use metrics::{ClassMetrics, Evaluation};
pub use trainer::{Trainer, TrainingReport};
