//! Classification service
//!
//! The entry points used by front ends: classify a message, record the
//! outcome, list and clear history, and report statistics. The loaded
//! pipeline and the history store are injected, never global.

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::classifier::{Label, Prediction, TrainedPipeline};
use crate::config::Config;
use crate::error::{Result, SpamError};
use crate::history::{ClassificationEvent, FileHistoryStore, HistoryQuery, HistoryStore};
use crate::stats::{SpamStats, StatsAggregator, StatsSummary};

/// Classification plus the event that was recorded for it
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub prediction: Prediction,
    pub event: ClassificationEvent,
}

pub struct SpamService {
    pipeline: Arc<TrainedPipeline>,
    history: Arc<dyn HistoryStore>,
    stats: StatsAggregator,
}

impl SpamService {
    pub fn new(pipeline: Arc<TrainedPipeline>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            pipeline,
            stats: StatsAggregator::new(history.clone()),
            history,
        }
    }

    /// Load the model and open the file history named by `config`.
    ///
    /// Fails when the model is missing or corrupt, so a process cannot
    /// start serving without one.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pipeline = TrainedPipeline::load(&config.model.path)?;
        let history = FileHistoryStore::from_config(&config.history);
        Ok(Self::new(Arc::new(pipeline), Arc::new(history)))
    }

    pub fn pipeline(&self) -> &TrainedPipeline {
        &self.pipeline
    }

    /// Label a message and report the posterior of the chosen label
    pub fn classify(&self, text: &str) -> Result<Prediction> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpamError::InvalidInput("message text is empty".to_string()));
        }

        let prediction = self.pipeline.predict(text)?;
        debug!(
            "Classified message as {} ({:.2})",
            prediction.label, prediction.confidence
        );
        Ok(prediction)
    }

    /// Append one classification to the history
    pub fn record_event(&self, label: Label, confidence: f64, text: &str) -> Result<ClassificationEvent> {
        let event = ClassificationEvent::new(label, confidence, text.trim());
        self.history.append(&event)?;
        Ok(event)
    }

    /// Classify and record in one call
    pub fn analyze(&self, text: &str) -> Result<AnalysisOutcome> {
        let prediction = self.classify(text)?;
        let event = self.record_event(prediction.label, prediction.confidence, text)?;
        Ok(AnalysisOutcome { prediction, event })
    }

    pub fn list_history(&self, query: &HistoryQuery) -> Result<Vec<String>> {
        self.history.query(query)
    }

    /// Erase the whole history. Callers are expected to confirm first.
    pub fn clear_history(&self) -> Result<()> {
        self.history.clear()
    }

    pub fn summarize(&self) -> Result<StatsSummary> {
        self.stats.summarize()
    }

    /// Counts over the history; zeroed when there is no usable data
    pub fn get_stats(&self) -> Result<SpamStats> {
        Ok(self.summarize()?.into())
    }
}
