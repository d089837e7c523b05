//! Multinomial naive Bayes over the two message classes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{FeatureVector, Label, Prediction};
use crate::error::{Result, SpamError};

/// Default additive smoothing constant
pub const DEFAULT_SMOOTHING: f64 = 1.0;

/// Fitted parameters of one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassModel {
    /// Fraction of training examples with this class
    pub prior: f64,
    /// Smoothed log-likelihood per vocabulary column
    pub log_likelihoods: Vec<f64>,
}

/// Bayesian spam classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    smoothing: f64,
    n_features: usize,
    classes: BTreeMap<Label, ClassModel>,
}

impl MultinomialNb {
    /// Estimate priors and Laplace-smoothed likelihoods
    pub fn fit(
        vectors: &[FeatureVector],
        labels: &[Label],
        n_features: usize,
        smoothing: f64,
    ) -> Result<Self> {
        if vectors.len() != labels.len() {
            return Err(SpamError::Training(format!(
                "{} feature vectors but {} labels",
                vectors.len(),
                labels.len()
            )));
        }
        if vectors.is_empty() {
            return Err(SpamError::Training("no training examples".to_string()));
        }
        if !(smoothing > 0.0 && smoothing.is_finite()) {
            return Err(SpamError::Training(format!(
                "smoothing must be positive, got {}",
                smoothing
            )));
        }

        let mut class_counts = [0usize; 2];
        let mut feature_counts = vec![vec![0.0f64; n_features]; 2];

        for (vector, label) in vectors.iter().zip(labels) {
            class_counts[label.index()] += 1;
            let row = &mut feature_counts[label.index()];
            for (index, weight) in vector.iter() {
                if index < n_features {
                    row[index] += weight;
                }
            }
        }

        let total = vectors.len() as f64;
        let classes = Label::ALL
            .iter()
            .filter(|label| class_counts[label.index()] > 0)
            .map(|label| {
                let row = &feature_counts[label.index()];
                let denominator = row.iter().sum::<f64>() + smoothing * n_features as f64;
                let log_likelihoods = row
                    .iter()
                    .map(|count| ((count + smoothing) / denominator).ln())
                    .collect();
                let model = ClassModel {
                    prior: class_counts[label.index()] as f64 / total,
                    log_likelihoods,
                };
                (*label, model)
            })
            .collect();

        Ok(Self {
            smoothing,
            n_features,
            classes,
        })
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn class(&self, label: Label) -> Option<&ClassModel> {
        self.classes.get(&label)
    }

    /// Unnormalized log-posterior per label, in `Label::ALL` order.
    ///
    /// A class unseen during training scores negative infinity.
    pub fn log_posteriors(&self, vector: &FeatureVector) -> [f64; 2] {
        Label::ALL.map(|label| match self.classes.get(&label) {
            Some(model) => {
                let evidence: f64 = vector
                    .iter()
                    .filter_map(|(index, weight)| {
                        model.log_likelihoods.get(index).map(|ll| weight * ll)
                    })
                    .sum();
                model.prior.ln() + evidence
            }
            None => f64::NEG_INFINITY,
        })
    }

    /// Pick the most probable label.
    ///
    /// Equal log-posteriors resolve to the lexicographically first label
    /// (HAM). A vector without non-zero features is rejected.
    pub fn predict(&self, vector: &FeatureVector) -> Result<Prediction> {
        if vector.is_empty() {
            return Err(SpamError::EmptyVector);
        }

        let scores = self.log_posteriors(vector);

        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = i;
            }
        }

        let max = scores[best];
        let total: f64 = scores.iter().map(|s| (s - max).exp()).sum();

        Ok(Prediction {
            label: Label::ALL[best],
            confidence: 1.0 / total,
        })
    }

    /// Structural checks for a deserialized model
    pub(crate) fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.n_features != n_features {
            return Err(format!(
                "classifier has {} features, vocabulary has {}",
                self.n_features, n_features
            ));
        }
        if !(self.smoothing > 0.0 && self.smoothing.is_finite()) {
            return Err(format!("invalid smoothing {}", self.smoothing));
        }
        for label in Label::ALL {
            let model = self
                .classes
                .get(&label)
                .ok_or_else(|| format!("missing parameters for class {}", label))?;
            if model.log_likelihoods.len() != n_features {
                return Err(format!(
                    "class {} has {} likelihoods, expected {}",
                    label,
                    model.log_likelihoods.len(),
                    n_features
                ));
            }
            if !(0.0..=1.0).contains(&model.prior) {
                return Err(format!("class {} has invalid prior {}", label, model.prior));
            }
            if model.log_likelihoods.iter().any(|ll| !ll.is_finite() || *ll > 0.0) {
                return Err(format!("class {} has invalid likelihoods", label));
            }
        }
        let prior_sum: f64 = self.classes.values().map(|m| m.prior).sum();
        if (prior_sum - 1.0).abs() > 1e-6 {
            return Err(format!("class priors sum to {}", prior_sum));
        }
        Ok(())
    }
}
