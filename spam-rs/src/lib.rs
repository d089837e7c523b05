//! spam-rs: Spam/ham text classifier with classification history
//!
//! Trains a TF-IDF + multinomial naive Bayes model on a labeled SMS corpus,
//! classifies new messages with it and keeps an append-only record of every
//! classification for later review and statistics.
//!
//! # Features
//!
//! - **Training**: Seeded train/test split, per-class evaluation report
//! - **Classification**: Deterministic label plus posterior confidence
//! - **History**: Human-readable log and `timestamp,label` projection
//! - **Statistics**: Spam/ham counts and spam percentage
//! - **Front ends**: REST API (`spam-rs`) and command line (`spam-cli`)
//!
//! # Example
//!
//! ```no_run
//! use spam_rs::config::Config;
//! use spam_rs::training::Trainer;
//! use spam_rs::SpamService;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!
//!     let trainer = Trainer::new(config.training.clone());
//!     let (_, report) = trainer.train(&config.training.dataset_path, &config.model.path)?;
//!     println!("{}", report);
//!
//!     let service = SpamService::from_config(&config)?;
//!     let outcome = service.analyze("WINNER!! Claim your free prize now")?;
//!     println!("{}", outcome.event.render());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`classifier`]: Feature extraction, naive Bayes and the persisted pipeline
//! - [`training`]: Dataset loading, splitting and evaluation
//! - [`history`]: Classification event log and queries
//! - [`stats`]: Aggregates over the structured history
//! - [`service`]: Classification entry points used by the front ends
//! - [`api`]: HTTP API
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod service;
pub mod stats;
pub mod training;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SpamError};
pub use service::SpamService;
