//! History types and rendering

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::classifier::Label;
use crate::error::SpamError;

/// Timestamp layout shared by both log projections
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header row of the structured projection
pub const STRUCTURED_HEADER: [&str; 2] = ["timestamp", "label"];

/// One analyzed message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEvent {
    pub timestamp: NaiveDateTime,
    pub label: Label,
    pub confidence: f64,
    pub text: String,
}

impl ClassificationEvent {
    /// Create an event stamped with the current local time
    pub fn new(label: Label, confidence: f64, text: impl Into<String>) -> Self {
        Self::at(Local::now().naive_local(), label, confidence, text)
    }

    pub fn at(
        timestamp: NaiveDateTime,
        label: Label,
        confidence: f64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            label,
            confidence: confidence.clamp(0.0, 1.0),
            text: text.into(),
        }
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Human-readable line: `[timestamp] marker | Confidence: c | Text: text`.
    ///
    /// Line breaks in the text are folded to spaces so the event stays on one line.
    pub fn render(&self) -> String {
        let text: String = self
            .text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();

        format!(
            "[{}] {} | Confidence: {:.2} | Text: {}",
            self.formatted_timestamp(),
            self.label.marker(),
            self.confidence,
            text
        )
    }

    /// Structured projection row
    pub fn structured_row(&self) -> String {
        format!("{},{}", self.formatted_timestamp(), self.label.as_str())
    }
}

/// Label carried by a rendered line, read from the marker after the timestamp
pub fn rendered_label(line: &str) -> Option<Label> {
    let rest = line.strip_prefix('[')?;
    let (_, rest) = rest.split_once("] ")?;
    Label::ALL
        .into_iter()
        .find(|label| rest.starts_with(label.marker()))
}

/// Label filter for history queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryFilter {
    #[default]
    All,
    Spam,
    Ham,
}

impl HistoryFilter {
    /// Lines without a recognizable label only pass `All`
    pub fn accepts(&self, label: Option<Label>) -> bool {
        match self {
            HistoryFilter::All => true,
            HistoryFilter::Spam => label == Some(Label::Spam),
            HistoryFilter::Ham => label == Some(Label::Ham),
        }
    }
}

impl FromStr for HistoryFilter {
    type Err = SpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(HistoryFilter::All),
            "spam" => Ok(HistoryFilter::Spam),
            "ham" => Ok(HistoryFilter::Ham),
            other => Err(SpamError::InvalidInput(format!("unknown filter '{}'", other))),
        }
    }
}

/// Result ordering for history queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryOrder {
    #[default]
    #[serde(rename = "newest")]
    NewestFirst,
    #[serde(rename = "oldest")]
    OldestFirst,
}

impl FromStr for HistoryOrder {
    type Err = SpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Ok(HistoryOrder::NewestFirst),
            "oldest" => Ok(HistoryOrder::OldestFirst),
            other => Err(SpamError::InvalidInput(format!("unknown order '{}'", other))),
        }
    }
}

/// Filter, then search, then order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub filter: HistoryFilter,
    #[serde(default)]
    pub order: HistoryOrder,
    /// Case-insensitive substring matched against the rendered line
    #[serde(default)]
    pub search: Option<String>,
}

impl HistoryQuery {
    pub fn new(filter: HistoryFilter, order: HistoryOrder, search: Option<&str>) -> Self {
        Self {
            filter,
            order,
            search: search.map(|s| s.to_string()),
        }
    }

    /// Apply the query to rendered lines in chronological order
    pub fn apply<I>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let needle = self
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase());

        let mut selected: Vec<String> = lines
            .into_iter()
            .filter(|line| self.filter.accepts(rendered_label(line)))
            .filter(|line| match &needle {
                Some(needle) => line.to_lowercase().contains(needle),
                None => true,
            })
            .collect();

        if self.order == HistoryOrder::NewestFirst {
            selected.reverse();
        }

        selected
    }
}

/// Raw content of the structured projection, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredProjection {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl StructuredProjection {
    /// Split comma-separated content; `None` when there is nothing but whitespace
    pub fn parse(content: &str) -> Option<Self> {
        let mut lines = content
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty());

        let header = split_fields(lines.next()?);
        let rows = lines.map(split_fields).collect();

        Some(Self { header, rows })
    }

    pub fn from_events<'a, I>(events: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a ClassificationEvent>,
    {
        let rows: Vec<Vec<String>> = events
            .into_iter()
            .map(|e| vec![e.formatted_timestamp(), e.label.as_str().to_string()])
            .collect();

        if rows.is_empty() {
            return None;
        }

        Some(Self {
            header: STRUCTURED_HEADER.iter().map(|h| h.to_string()).collect(),
            rows,
        })
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(|f| f.trim().to_string()).collect()
}
