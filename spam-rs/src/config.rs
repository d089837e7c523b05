use crate::error::{Result, SpamError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides, e.g. `SPAM_RS__MODEL__PATH`
pub const ENV_PREFIX: &str = "SPAM_RS";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub history: HistoryConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Human-readable log, one rendered event per line
    pub log_path: PathBuf,
    /// Structured `timestamp,label` log used for statistics
    pub structured_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainingConfig {
    pub dataset_path: PathBuf,
    pub delimiter: Delimiter,
    pub test_ratio: f64,
    pub seed: u64,
    pub smoothing: f64,
    pub stop_words: StopWordLanguage,
    #[serde(default)]
    pub extra_stop_words: Vec<String>,
    pub stemming: bool,
    pub normalize: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Column delimiter of a training dataset
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// Tab if the first non-blank row contains one, comma otherwise
    Auto,
    Tab,
    Comma,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StopWordLanguage {
    English,
    Spanish,
    None,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the environment.
    ///
    /// Later sources override earlier ones. A missing file is only an error
    /// when a path was given explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| SpamError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name("config.toml").required(false)),
        };

        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| SpamError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SpamError::Config(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                listen_addr: "0.0.0.0:8080".to_string(),
            },
            model: ModelConfig {
                path: PathBuf::from("models/spam_model.json"),
            },
            history: HistoryConfig {
                log_path: PathBuf::from("history.txt"),
                structured_path: PathBuf::from("history.csv"),
            },
            training: TrainingConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/SMSSpamCollection"),
            delimiter: Delimiter::Auto,
            test_ratio: 0.2,
            seed: 42,
            smoothing: 1.0,
            stop_words: StopWordLanguage::English,
            extra_stop_words: Vec::new(),
            stemming: false,
            normalize: false,
        }
    }
}
