//! Trainable, persistable classification pipeline
//!
//! Composes the TF-IDF feature extractor with the naive Bayes classifier.
//! A fitted pipeline is immutable: predicting takes `&self` and the
//! artifact on disk is only ever replaced as a whole.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::features::{FeatureExtractor, FeatureSettings, Vocabulary};
use super::naive_bayes::MultinomialNb;
use super::types::{FeatureVector, Label, LabeledExample, Prediction};
use crate::error::{Result, SpamError};

/// Version of the on-disk model document
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Serialized form of a trained pipeline
#[derive(Debug, Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    features: FeatureSettings,
    vocabulary: Vocabulary,
    classifier: MultinomialNb,
}

/// Fitted vocabulary plus classifier parameters
pub struct TrainedPipeline {
    extractor: FeatureExtractor,
    vocabulary: Vocabulary,
    classifier: MultinomialNb,
}

impl TrainedPipeline {
    /// Fit the extractor on the example texts, then the classifier on the vectors
    pub fn fit(
        examples: &[LabeledExample],
        settings: FeatureSettings,
        smoothing: f64,
    ) -> Result<Self> {
        let extractor = FeatureExtractor::new(settings);
        let texts: Vec<&str> = examples.iter().map(|e| e.text.as_str()).collect();
        let vocabulary = extractor.fit(&texts)?;

        let vectors: Vec<FeatureVector> = texts
            .iter()
            .map(|text| extractor.transform(text, &vocabulary))
            .collect();
        let labels: Vec<Label> = examples.iter().map(|e| e.label).collect();
        if let Some(missing) = Label::ALL.iter().find(|l| !labels.contains(l)) {
            return Err(SpamError::Training(format!(
                "training data has no {} examples",
                missing
            )));
        }

        let classifier = MultinomialNb::fit(&vectors, &labels, vocabulary.len(), smoothing)?;

        debug!(
            "Fitted pipeline on {} examples, vocabulary size {}",
            examples.len(),
            vocabulary.len()
        );

        Ok(Self {
            extractor,
            vocabulary,
            classifier,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn classifier(&self) -> &MultinomialNb {
        &self.classifier
    }

    pub fn settings(&self) -> &FeatureSettings {
        self.extractor.settings()
    }

    pub fn transform(&self, text: &str) -> FeatureVector {
        self.extractor.transform(text, &self.vocabulary)
    }

    /// Classify a message
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        self.classifier.predict(&self.transform(text))
    }

    /// Write the whole pipeline to `path`.
    ///
    /// The document goes to a sibling temporary file first and is renamed
    /// into place, so readers never see a partially written model.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let artifact = ModelArtifact {
            format_version: MODEL_FORMAT_VERSION,
            features: self.extractor.settings().clone(),
            vocabulary: self.vocabulary.clone(),
            classifier: self.classifier.clone(),
        };
        let data = serde_json::to_vec(&artifact)?;

        let tmp_path = tmp_path_for(path);
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, path)?;

        info!("Saved model to {}", path.display());
        Ok(())
    }

    /// Read a pipeline written by [`TrainedPipeline::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SpamError::ModelNotFound(path.to_path_buf()));
        }

        let data = fs::read(path)?;
        let artifact: ModelArtifact = serde_json::from_slice(&data)
            .map_err(|e| SpamError::CorruptModel(e.to_string()))?;

        if artifact.format_version != MODEL_FORMAT_VERSION {
            return Err(SpamError::CorruptModel(format!(
                "unsupported format version {}",
                artifact.format_version
            )));
        }
        artifact
            .vocabulary
            .validate()
            .map_err(SpamError::CorruptModel)?;
        artifact
            .classifier
            .validate(artifact.vocabulary.len())
            .map_err(SpamError::CorruptModel)?;

        info!(
            "Loaded model from {} ({} terms)",
            path.display(),
            artifact.vocabulary.len()
        );

        Ok(Self {
            extractor: FeatureExtractor::new(artifact.features),
            vocabulary: artifact.vocabulary,
            classifier: artifact.classifier,
        })
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DEFAULT_SMOOTHING;

    fn sample_examples() -> Vec<LabeledExample> {
        vec![
            LabeledExample::new(Label::Spam, "Win a free prize now, click here"),
            LabeledExample::new(Label::Spam, "Free entry to win cash, click the link"),
            LabeledExample::new(Label::Spam, "Click to claim your free reward and win big"),
            LabeledExample::new(Label::Ham, "Are we still meeting for lunch tomorrow?"),
            LabeledExample::new(Label::Ham, "Thanks for your help with the project"),
            LabeledExample::new(Label::Ham, "I will send you the file when it is ready"),
            LabeledExample::new(Label::Ham, "Call me when you get home tonight"),
        ]
    }

    fn fitted() -> TrainedPipeline {
        TrainedPipeline::fit(&sample_examples(), FeatureSettings::default(), DEFAULT_SMOOTHING)
            .unwrap()
    }

    #[test]
    fn test_classifies_held_out_spam() {
        let pipeline = fitted();
        let prediction = pipeline.predict("click here to win a free prize").unwrap();
        assert_eq!(prediction.label, Label::Spam);
        assert!(prediction.confidence > 0.5);
    }

    #[test]
    fn test_classifies_conversational_ham() {
        let pipeline = fitted();
        let prediction = pipeline.predict("thanks, see you at lunch tomorrow").unwrap();
        assert_eq!(prediction.label, Label::Ham);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let pipeline = fitted();
        let first = pipeline.predict("win free cash").unwrap();
        let second = pipeline.predict("win free cash").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fit_requires_both_classes() {
        let examples = vec![
            LabeledExample::new(Label::Spam, "win a free prize"),
            LabeledExample::new(Label::Spam, "click for free cash"),
        ];
        assert!(matches!(
            TrainedPipeline::fit(&examples, FeatureSettings::default(), DEFAULT_SMOOTHING),
            Err(SpamError::Training(_))
        ));
    }

    #[test]
    fn test_unknown_words_only_is_empty_vector() {
        let pipeline = fitted();
        assert!(matches!(
            pipeline.predict("zebra xylophone"),
            Err(SpamError::EmptyVector)
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("model.json");

        let pipeline = fitted();
        pipeline.save(&path).unwrap();
        assert!(path.exists());
        assert!(!tmp_path_for(&path).exists());

        let loaded = TrainedPipeline::load(&path).unwrap();
        assert_eq!(loaded.vocabulary().len(), pipeline.vocabulary().len());
        assert_eq!(loaded.settings(), pipeline.settings());

        for text in [
            "click here to win a free prize",
            "lunch tomorrow?",
            "free lunch",
            "send the project file",
        ] {
            let a = pipeline.predict(text).unwrap();
            let b = loaded.predict(text).unwrap();
            assert_eq!(a.label, b.label);
            assert!((a.confidence - b.confidence).abs() < 1e-9);
        }
    }

    #[test]
    fn test_load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let result = TrainedPipeline::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(SpamError::ModelNotFound(_))));
    }

    #[test]
    fn test_load_corrupt_model() {
        let dir = tempfile::tempdir().unwrap();

        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, b"not json at all").unwrap();
        assert!(matches!(
            TrainedPipeline::load(&garbage),
            Err(SpamError::CorruptModel(_))
        ));

        let missing_fields = dir.path().join("partial.json");
        fs::write(&missing_fields, br#"{"format_version": 1, "vocabulary": {"terms": {}}}"#)
            .unwrap();
        assert!(matches!(
            TrainedPipeline::load(&missing_fields),
            Err(SpamError::CorruptModel(_))
        ));
    }

    #[test]
    fn test_load_rejects_mismatched_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fitted().save(&path).unwrap();

        let mut doc: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        doc["classifier"]["classes"]["SPAM"]["log_likelihoods"]
            .as_array_mut()
            .unwrap()
            .pop();
        fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

        assert!(matches!(
            TrainedPipeline::load(&path),
            Err(SpamError::CorruptModel(_))
        ));
    }
}
