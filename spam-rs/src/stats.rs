//! Statistics over the structured history projection

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::classifier::Label;
use crate::error::{Result, SpamError};
use crate::history::{HistoryStore, StructuredProjection, STRUCTURED_HEADER};

/// Aggregate counts of recorded classifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SpamStats {
    pub total: u64,
    pub spam_count: u64,
    pub ham_count: u64,
    /// `spam_count / total * 100`, 0 when there is no data
    pub spam_percentage: f64,
}

impl SpamStats {
    pub fn from_counts(spam_count: u64, ham_count: u64) -> Self {
        let total = spam_count + ham_count;
        let spam_percentage = if total == 0 {
            0.0
        } else {
            spam_count as f64 / total as f64 * 100.0
        };

        Self {
            total,
            spam_count,
            ham_count,
            spam_percentage,
        }
    }
}

/// Result of summarizing the structured projection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatsSummary {
    /// Nothing recorded yet
    NoData,
    /// The projection failed row-shape validation
    Malformed { reason: String },
    Available(SpamStats),
}

impl StatsSummary {
    pub fn has_data(&self) -> bool {
        matches!(self, StatsSummary::Available(s) if s.total > 0)
    }
}

impl From<StatsSummary> for SpamStats {
    fn from(summary: StatsSummary) -> Self {
        match summary {
            StatsSummary::Available(stats) => stats,
            StatsSummary::NoData | StatsSummary::Malformed { .. } => SpamStats::default(),
        }
    }
}

/// Validate the projection and count labels
pub fn summarize_projection(projection: Option<&StructuredProjection>) -> StatsSummary {
    let Some(projection) = projection else {
        return StatsSummary::NoData;
    };

    if projection.header.len() != STRUCTURED_HEADER.len()
        || projection
            .header
            .iter()
            .zip(STRUCTURED_HEADER)
            .any(|(actual, expected)| actual.as_str() != expected)
    {
        return StatsSummary::Malformed {
            reason: format!("unexpected header {:?}", projection.header),
        };
    }

    let mut spam_count = 0u64;
    let mut ham_count = 0u64;

    for (i, row) in projection.rows.iter().enumerate() {
        if row.len() != STRUCTURED_HEADER.len() {
            return StatsSummary::Malformed {
                reason: format!("row {} has {} fields", i + 1, row.len()),
            };
        }
        match row[1].parse::<Label>() {
            Ok(Label::Spam) => spam_count += 1,
            Ok(Label::Ham) => ham_count += 1,
            Err(_) => {
                return StatsSummary::Malformed {
                    reason: format!("row {} has unknown label '{}'", i + 1, row[1]),
                }
            }
        }
    }

    if spam_count + ham_count == 0 {
        return StatsSummary::NoData;
    }

    StatsSummary::Available(SpamStats::from_counts(spam_count, ham_count))
}

/// Reads the structured projection of a history store on demand
pub struct StatsAggregator {
    store: Arc<dyn HistoryStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Summarize the current history.
    ///
    /// A malformed projection is logged and reported as a summary, never
    /// as an error; only I/O failures propagate.
    pub fn summarize(&self) -> Result<StatsSummary> {
        let summary = match self.store.read_structured() {
            Ok(projection) => summarize_projection(projection.as_ref()),
            Err(SpamError::MalformedHistory(reason)) => StatsSummary::Malformed { reason },
            Err(e) => return Err(e),
        };

        if let StatsSummary::Malformed { reason } = &summary {
            warn!("Structured history is malformed: {}", reason);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{ClassificationEvent, FileHistoryStore, MemoryHistoryStore};
    use std::fs;
    use std::io::Write;

    #[test]
    fn test_counts_and_percentage() {
        let store = Arc::new(MemoryHistoryStore::new());
        for _ in 0..3 {
            store
                .append(&ClassificationEvent::new(Label::Spam, 0.9, "spam"))
                .unwrap();
        }
        for _ in 0..7 {
            store
                .append(&ClassificationEvent::new(Label::Ham, 0.9, "ham"))
                .unwrap();
        }

        let aggregator = StatsAggregator::new(store);
        let summary = aggregator.summarize().unwrap();
        assert!(summary.has_data());

        let stats = SpamStats::from(summary);
        assert_eq!(stats.total, 10);
        assert_eq!(stats.spam_count, 3);
        assert_eq!(stats.ham_count, 7);
        assert!((stats.spam_percentage - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_store_is_no_data() {
        let aggregator = StatsAggregator::new(Arc::new(MemoryHistoryStore::new()));
        let summary = aggregator.summarize().unwrap();
        assert_eq!(summary, StatsSummary::NoData);

        let stats = SpamStats::from(summary);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.spam_percentage, 0.0);
    }

    #[test]
    fn test_header_only_is_no_data() {
        let projection = StructuredProjection::parse("timestamp,label\n");
        assert_eq!(summarize_projection(projection.as_ref()), StatsSummary::NoData);
    }

    #[test]
    fn test_malformed_projections() {
        for content in [
            "time,result\n2024-01-01 00:00:00,spam\n",
            "timestamp,label\n2024-01-01 00:00:00\n",
            "timestamp,label\n2024-01-01 00:00:00,spam,extra\n",
            "timestamp,label\n2024-01-01 00:00:00,maybe\n",
        ] {
            let projection = StructuredProjection::parse(content);
            let summary = summarize_projection(projection.as_ref());
            assert!(
                matches!(summary, StatsSummary::Malformed { .. }),
                "expected malformed for {:?}",
                content
            );
            assert_eq!(SpamStats::from(summary).total, 0);
        }
    }

    #[test]
    fn test_malformed_file_reports_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path().join("h.txt"), dir.path().join("h.csv"));
        fs::write(store.structured_path(), "garbage\nrow").unwrap();

        let aggregator = StatsAggregator::new(Arc::new(store));
        let summary = aggregator.summarize().unwrap();
        assert!(matches!(summary, StatsSummary::Malformed { .. }));
        assert!(!summary.has_data());
    }

    #[test]
    fn test_undecodable_file_reports_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path().join("h.txt"), dir.path().join("h.csv"));
        store
            .append(&ClassificationEvent::new(Label::Spam, 0.9, "spam"))
            .unwrap();

        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(store.structured_path())
            .unwrap();
        file.write_all(b"2024-01-01 00:00:00,\xff\xfe\n").unwrap();

        let aggregator = StatsAggregator::new(Arc::new(store));
        let summary = aggregator.summarize().unwrap();
        assert!(matches!(summary, StatsSummary::Malformed { .. }));
        assert_eq!(SpamStats::from(summary), SpamStats::default());
    }
}
