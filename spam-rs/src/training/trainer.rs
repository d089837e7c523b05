//! Model training driver
//!
//! Reads the labeled dataset, fits the pipeline on the training partition,
//! evaluates it on the held-out partition and persists it.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

use super::dataset::{load_dataset, train_test_split};
use super::metrics::Evaluation;
use crate::classifier::{FeatureSettings, Label, TrainedPipeline};
use crate::config::TrainingConfig;
use crate::error::{Result, SpamError};

/// Outcome of one training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub train_size: usize,
    pub test_size: usize,
    pub vocabulary_size: usize,
    pub evaluation: Evaluation,
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model evaluation:")?;
        writeln!(f, "{}", self.evaluation)?;
        writeln!(
            f,
            "train: {}  test: {}  vocabulary: {}",
            self.train_size, self.test_size, self.vocabulary_size
        )?;
        write!(f, "Model saved to: {}", self.model_path.display())
    }
}

/// Trains and persists the classification pipeline
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on `dataset_path` and write the fitted model to `model_path`
    pub fn train<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        dataset_path: P,
        model_path: Q,
    ) -> Result<(TrainedPipeline, TrainingReport)> {
        let dataset_path = dataset_path.as_ref();
        let model_path = model_path.as_ref();

        info!("Loading dataset from {}", dataset_path.display());
        let examples = load_dataset(dataset_path, self.config.delimiter)?;

        let (train, test) = train_test_split(&examples, self.config.test_ratio, self.config.seed)?;
        info!(
            "Split {} examples into {} train / {} test (seed {})",
            examples.len(),
            train.len(),
            test.len(),
            self.config.seed
        );

        let pipeline = TrainedPipeline::fit(
            &train,
            FeatureSettings::from(&self.config),
            self.config.smoothing,
        )?;

        let actual: Vec<Label> = test.iter().map(|e| e.label).collect();
        let predicted = test
            .iter()
            .map(|e| predict_label(&pipeline, &e.text))
            .collect::<Result<Vec<Label>>>()?;
        let evaluation = Evaluation::from_predictions(&actual, &predicted);
        info!("Test accuracy: {:.4}", evaluation.accuracy);

        pipeline.save(model_path)?;

        let report = TrainingReport {
            dataset_path: dataset_path.to_path_buf(),
            model_path: model_path.to_path_buf(),
            train_size: train.len(),
            test_size: test.len(),
            vocabulary_size: pipeline.vocabulary().len(),
            evaluation,
        };

        Ok((pipeline, report))
    }
}

/// Label used when scoring the test partition.
///
/// A held-out message with no known terms cannot be scored, so it falls
/// back to the class with the higher prior; this keeps every test example
/// in the evaluation. Any other failure propagates.
fn predict_label(pipeline: &TrainedPipeline, text: &str) -> Result<Label> {
    match pipeline.predict(text) {
        Ok(prediction) => Ok(prediction.label),
        Err(SpamError::EmptyVector) => {
            let classifier = pipeline.classifier();
            let prior = |label| classifier.class(label).map(|m| m.prior).unwrap_or(0.0);
            if prior(Label::Spam) > prior(Label::Ham) {
                Ok(Label::Spam)
            } else {
                Ok(Label::Ham)
            }
        }
        Err(e) => Err(e),
    }
}
