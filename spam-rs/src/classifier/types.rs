//! Classifier types and data structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SpamError;

/// Message class.
///
/// Variant order is the lexicographic order of the lowercase names
/// (`ham` < `spam`); ties between classes resolve to the smaller one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    /// All labels in tie-break order
    pub const ALL: [Label; 2] = [Label::Ham, Label::Spam];

    /// Lowercase name, as used in datasets and the structured history log
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Ham => "ham",
            Label::Spam => "spam",
        }
    }

    /// Marker embedded in rendered history lines
    pub fn marker(&self) -> &'static str {
        match self {
            Label::Ham => "✅ HAM",
            Label::Spam => "🚫 SPAM",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Label::Ham => 0,
            Label::Spam => 1,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Ham => write!(f, "HAM"),
            Label::Spam => write!(f, "SPAM"),
        }
    }
}

impl FromStr for Label {
    type Err = SpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ham" => Ok(Label::Ham),
            "spam" => Ok(Label::Spam),
            other => Err(SpamError::InvalidInput(format!("unknown label '{}'", other))),
        }
    }
}

/// A labeled training message
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub text: String,
    pub label: Label,
}

impl LabeledExample {
    pub fn new(label: Label, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Sparse term weights keyed by vocabulary column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    weights: BTreeMap<usize, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, index: usize, weight: f64) {
        *self.weights.entry(index).or_insert(0.0) += weight;
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        for weight in self.weights.values_mut() {
            *weight *= factor;
        }
    }

    /// Iterate non-zero `(column, weight)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(i, w)| (*i, *w))
    }

    pub fn get(&self, index: usize) -> f64 {
        self.weights.get(&index).copied().unwrap_or(0.0)
    }

    /// Number of non-zero features
    pub fn nnz(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.nnz() == 0
    }

    pub fn norm(&self) -> f64 {
        self.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }
}

/// Classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    /// Posterior probability of `label`, in [0, 1]
    pub confidence: f64,
}
