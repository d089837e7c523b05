//! TF-IDF feature extraction
//!
//! Tokenizes messages into lowercase word terms, drops stop words and
//! weights each known term by term frequency times inverse document frequency.

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::types::FeatureVector;
use crate::config::{StopWordLanguage, TrainingConfig};
use crate::error::{Result, SpamError};

/// Terms of two or more word characters
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

const SPANISH_STOP_WORDS: &[&str] = &[
    "a", "al", "algo", "algunas", "algunos", "ante", "antes", "como", "con", "contra", "cual",
    "cuando", "de", "del", "desde", "donde", "durante", "e", "el", "ella", "ellas", "ellos",
    "en", "entre", "era", "es", "esa", "esas", "ese", "eso", "esos", "esta", "estaba", "estas",
    "este", "esto", "estos", "fue", "ha", "hay", "la", "las", "le", "les", "lo", "los", "mas",
    "me", "mi", "mis", "mucho", "muy", "nada", "ni", "no", "nos", "nosotros", "o", "os", "otra",
    "otro", "para", "pero", "poco", "por", "porque", "que", "quien", "se", "ser", "si", "sin",
    "sobre", "son", "su", "sus", "también", "te", "tu", "tus", "un", "una", "uno", "unos",
    "vosotros", "y", "ya", "yo",
];

/// Persisted feature extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSettings {
    pub stop_words: StopWordLanguage,
    #[serde(default)]
    pub extra_stop_words: Vec<String>,
    #[serde(default)]
    pub stemming: bool,
    #[serde(default)]
    pub normalize: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            stop_words: StopWordLanguage::English,
            extra_stop_words: Vec::new(),
            stemming: false,
            normalize: false,
        }
    }
}

impl From<&TrainingConfig> for FeatureSettings {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            stop_words: config.stop_words,
            extra_stop_words: config.extra_stop_words.clone(),
            stemming: config.stemming,
            normalize: config.normalize,
        }
    }
}

/// A vocabulary entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermStats {
    /// Column in feature vectors
    pub index: usize,
    /// Inverse document frequency
    pub idf: f64,
}

/// Terms known at training time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: BTreeMap<String, TermStats>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<&TermStats> {
        self.terms.get(term)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TermStats)> {
        self.terms.iter().map(|(t, s)| (t.as_str(), s))
    }

    /// Check that indices cover `0..len` exactly once and IDF weights are usable
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = vec![false; self.terms.len()];
        for (term, stats) in &self.terms {
            if stats.index >= seen.len() || seen[stats.index] {
                return Err(format!("term '{}' has invalid column {}", term, stats.index));
            }
            seen[stats.index] = true;
            if !stats.idf.is_finite() || stats.idf <= 0.0 {
                return Err(format!("term '{}' has invalid idf {}", term, stats.idf));
            }
        }
        Ok(())
    }
}

/// Tokenizer plus stop-word filter and optional stemmer
pub struct FeatureExtractor {
    settings: FeatureSettings,
    token_re: Regex,
    stop_words: HashSet<String>,
    stemmer: Option<Stemmer>,
}

impl FeatureExtractor {
    pub fn new(settings: FeatureSettings) -> Self {
        let base: &[&str] = match settings.stop_words {
            StopWordLanguage::English => ENGLISH_STOP_WORDS,
            StopWordLanguage::Spanish => SPANISH_STOP_WORDS,
            StopWordLanguage::None => &[],
        };

        let stop_words = base
            .iter()
            .map(|w| w.to_string())
            .chain(settings.extra_stop_words.iter().map(|w| w.to_lowercase()))
            .collect();

        let stemmer = settings.stemming.then(|| {
            Stemmer::create(match settings.stop_words {
                StopWordLanguage::Spanish => Algorithm::Spanish,
                _ => Algorithm::English,
            })
        });

        Self {
            settings,
            // The pattern is a constant known to compile
            token_re: Regex::new(TOKEN_PATTERN).unwrap(),
            stop_words,
            stemmer,
        }
    }

    pub fn settings(&self) -> &FeatureSettings {
        &self.settings
    }

    /// Split text into lowercase terms, dropping stop words
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.token_re
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .map(|t| match &self.stemmer {
                Some(stemmer) => stemmer.stem(t).to_string(),
                None => t.to_string(),
            })
            .collect()
    }

    /// Build the vocabulary and IDF weights from a training corpus
    pub fn fit<S: AsRef<str>>(&self, corpus: &[S]) -> Result<Vocabulary> {
        if corpus.is_empty() {
            return Err(SpamError::EmptyCorpus);
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for document in corpus {
            let unique: BTreeSet<String> = self.tokenize(document.as_ref()).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(SpamError::EmptyCorpus);
        }

        let n = corpus.len() as f64;
        let sorted: BTreeMap<String, usize> = document_frequency.into_iter().collect();
        let terms = sorted
            .into_iter()
            .enumerate()
            .map(|(index, (term, df))| {
                let idf = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                (term, TermStats { index, idf })
            })
            .collect();

        Ok(Vocabulary { terms })
    }

    /// Weight each known term by `tf * idf`; unknown terms are dropped
    pub fn transform(&self, text: &str, vocabulary: &Vocabulary) -> FeatureVector {
        let mut vector = FeatureVector::new();
        for term in self.tokenize(text) {
            if let Some(stats) = vocabulary.get(&term) {
                vector.add(stats.index, stats.idf);
            }
        }

        if self.settings.normalize {
            let norm = vector.norm();
            if norm > 0.0 {
                vector.scale(1.0 / norm);
            }
        }

        vector
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureSettings::default())
    }
}
