//! Command line front end for spam-rs
//!
//! # Usage
//!
//! ```bash
//! # Train a model from the configured dataset
//! spam-cli train --dataset data/SMSSpamCollection
//!
//! # Classify a message and record it in the history
//! spam-cli predict "WINNER!! Claim your prize" --record
//!
//! # Review the history
//! spam-cli history --filter spam --order oldest --search prize
//!
//! # Show statistics
//! spam-cli stats
//!
//! # Erase the history
//! spam-cli clear --yes
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use spam_rs::config::Config;
use spam_rs::history::{FileHistoryStore, HistoryFilter, HistoryOrder, HistoryQuery, HistoryStore};
use spam_rs::logging::init_tracing;
use spam_rs::stats::{StatsAggregator, StatsSummary};
use spam_rs::training::Trainer;
use spam_rs::SpamService;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "spam-cli")]
#[command(about = "Train, run and inspect the spam classifier", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model and print the evaluation report
    Train {
        /// Labeled dataset, overrides the configured path
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Where to write the model, overrides the configured path
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Classify a message
    Predict {
        /// Message text
        text: String,
        /// Append the result to the history
        #[arg(long)]
        record: bool,
    },
    /// List recorded classifications
    History {
        /// all, spam or ham
        #[arg(long, default_value = "all")]
        filter: HistoryFilter,
        /// newest or oldest
        #[arg(long, default_value = "newest")]
        order: HistoryOrder,
        /// Case-insensitive substring to look for
        #[arg(long)]
        search: Option<String>,
    },
    /// Show spam/ham statistics
    Stats,
    /// Erase the whole history
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    match cli.command {
        Commands::Train { dataset, model } => {
            if let Some(dataset) = dataset {
                config.training.dataset_path = dataset;
            }
            if let Some(model) = model {
                config.model.path = model;
            }

            let trainer = Trainer::new(config.training.clone());
            let (_, report) = trainer
                .train(&config.training.dataset_path, &config.model.path)
                .context("Training failed")?;
            println!("{}", report);
        }
        Commands::Predict { text, record } => {
            let service = load_service(&config)?;
            if record {
                let outcome = service.analyze(&text)?;
                println!("{}", outcome.event.render());
            } else {
                let prediction = service.classify(&text)?;
                println!(
                    "{} {} | Confidence: {:.2}",
                    prediction.label.marker(),
                    prediction.label,
                    prediction.confidence
                );
            }
        }
        Commands::History {
            filter,
            order,
            search,
        } => {
            let store = FileHistoryStore::from_config(&config.history);
            let query = HistoryQuery::new(filter, order, search.as_deref());
            let lines = store.query(&query)?;
            if lines.is_empty() {
                println!("No history entries found");
            }
            for line in lines {
                println!("{}", line);
            }
        }
        Commands::Stats => {
            let store = Arc::new(FileHistoryStore::from_config(&config.history));
            let summary = StatsAggregator::new(store).summarize()?;
            write_stats(&summary, &mut io::stdout().lock(), &mut io::stderr().lock())?;
        }
        Commands::Clear { yes } => {
            if !yes && !confirm("Erase the whole classification history?")? {
                println!("Aborted");
                return Ok(());
            }
            FileHistoryStore::from_config(&config.history).clear()?;
            println!("✓ History cleared");
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn load_service(config: &Config) -> anyhow::Result<SpamService> {
    SpamService::from_config(config).with_context(|| {
        format!(
            "Failed to load model from {} (run `spam-cli train` first)",
            config.model.path.display()
        )
    })
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Print a stats summary; a malformed history is a warning, not a failure
fn write_stats(summary: &StatsSummary, out: &mut impl Write, err: &mut impl Write) -> io::Result<()> {
    match summary {
        StatsSummary::Available(stats) => {
            writeln!(out, "Total classified: {}", stats.total)?;
            writeln!(out, "Spam: {}", stats.spam_count)?;
            writeln!(out, "Ham: {}", stats.ham_count)?;
            writeln!(out, "Spam percentage: {:.2}%", stats.spam_percentage)?;
        }
        StatsSummary::NoData => writeln!(out, "No data yet")?,
        StatsSummary::Malformed { reason } => {
            writeln!(err, "Warning: structured history is malformed: {}", reason)?;
            writeln!(out, "No data yet")?;
        }
    }
    Ok(())
}
