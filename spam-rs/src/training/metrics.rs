//! Evaluation metrics for the binary classifier

use serde::Serialize;
use std::fmt;

use crate::classifier::Label;

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of test examples whose true label is `label`
    pub support: usize,
}

/// Per-class metrics plus overall accuracy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub total: usize,
}

impl Evaluation {
    /// Compare true labels with predicted labels pairwise
    pub fn from_predictions(actual: &[Label], predicted: &[Label]) -> Self {
        let pairs: Vec<(Label, Label)> = actual
            .iter()
            .copied()
            .zip(predicted.iter().copied())
            .collect();
        let total = pairs.len();

        let classes = Label::ALL
            .iter()
            .map(|&label| {
                let tp = pairs.iter().filter(|(a, p)| *a == label && *p == label).count();
                let fp = pairs.iter().filter(|(a, p)| *a != label && *p == label).count();
                let fn_ = pairs.iter().filter(|(a, p)| *a == label && *p != label).count();

                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1,
                    support: tp + fn_,
                }
            })
            .collect();

        let correct = pairs.iter().filter(|(a, p)| a == p).count();

        Self {
            classes,
            accuracy: ratio(correct, total),
            total,
        }
    }

    pub fn class(&self, label: Label) -> Option<&ClassMetrics> {
        self.classes.iter().find(|m| m.label == label)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<8} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for m in &self.classes {
            writeln!(
                f,
                "{:<8} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                m.label.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        write!(f, "\naccuracy: {:.4} ({} examples)", self.accuracy, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        use Label::*;
        let actual = [Spam, Spam, Spam, Ham, Ham];
        let predicted = [Spam, Spam, Ham, Ham, Spam];
        let eval = Evaluation::from_predictions(&actual, &predicted);

        assert_eq!(eval.total, 5);
        assert!((eval.accuracy - 0.6).abs() < 1e-12);

        let spam = eval.class(Spam).unwrap();
        assert!((spam.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((spam.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((spam.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(spam.support, 3);

        let ham = eval.class(Ham).unwrap();
        assert!((ham.precision - 0.5).abs() < 1e-12);
        assert!((ham.recall - 0.5).abs() < 1e-12);
        assert_eq!(ham.support, 2);
    }

    #[test]
    fn test_zero_denominators() {
        let eval = Evaluation::from_predictions(&[Label::Ham], &[Label::Ham]);
        let spam = eval.class(Label::Spam).unwrap();
        assert_eq!(spam.precision, 0.0);
        assert_eq!(spam.recall, 0.0);
        assert_eq!(spam.f1, 0.0);
        assert_eq!(eval.accuracy, 1.0);

        let empty = Evaluation::from_predictions(&[], &[]);
        assert_eq!(empty.accuracy, 0.0);
        assert_eq!(empty.total, 0);
    }

    #[test]
    fn test_display() {
        let eval = Evaluation::from_predictions(&[Label::Ham, Label::Spam], &[Label::Ham, Label::Spam]);
        let text = eval.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("spam"));
        assert!(text.contains("accuracy: 1.0000"));
    }
}
