//! Logbook CLI
//!
//! Replays JSON-lines event records through a recorder and prints its
//! history, metrics, analysis or an export.
//!
//! # Usage
//!
//! ```bash
//! logbook --help
//! logbook --input events.jsonl metrics
//! logbook --min-level warn --max-entries 500 analyze < events.jsonl
//! logbook --input events.jsonl export --format plain
//! ```
//!
//! Each input line is a JSON object such as
//! `{"level": "error", "message": "Query failed", "component": "db"}`.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use logbook_core::models::{ErrorDetail, Payload, Severity};
use logbook_core::{ExportFormat, Logger, Recorder, RecorderConfig};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Logbook CLI - replay, analyze and export structured event logs
#[derive(Parser)]
#[command(name = "logbook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON-lines input file (reads stdin when omitted)
    #[arg(short, long, env = "LOGBOOK_INPUT")]
    input: Option<PathBuf>,

    /// Minimum severity to retain (overrides LOGBOOK_LEVEL)
    #[arg(long)]
    min_level: Option<Severity>,

    /// Retained history capacity (overrides LOGBOOK_MAX_ENTRIES)
    #[arg(long)]
    max_entries: Option<usize>,

    /// Default component label (overrides LOGBOOK_COMPONENT)
    #[arg(long)]
    component: Option<String>,

    /// Emit internal diagnostics as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the retained history as JSON
    History {
        /// Only show events at or above this severity
        #[arg(long)]
        min_level: Option<Severity>,

        /// Only show the most recent N events
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print aggregate metrics
    Metrics,
    /// Print the analysis report
    Analyze,
    /// Export the retained history
    Export {
        /// Output format: structured or plain
        #[arg(short, long, default_value = "structured")]
        format: ExportFormat,
    },
}

/// One input line.
#[derive(Debug, Deserialize)]
struct IngestRecord {
    #[serde(default)]
    level: Severity,
    message: String,
    #[serde(default)]
    component: Option<String>,
    #[serde(default)]
    payload: Option<Payload>,
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    correlation_id: Option<String>,
}

/// Outcome of a replay.
#[derive(Debug, Default, PartialEq, Eq)]
struct ReplayStats {
    replayed: usize,
    skipped: usize,
}

impl Cli {
    /// Builds the recorder configuration from the environment and flags.
    fn recorder_config(&self) -> Result<RecorderConfig> {
        let mut config = RecorderConfig::from_env().context("Invalid LOGBOOK_* environment")?;
        if let Some(level) = self.min_level {
            config.min_level = level;
        }
        if let Some(max_entries) = self.max_entries {
            config.max_entries = max_entries;
        }
        if let Some(ref component) = self.component {
            config.component.clone_from(component);
        }
        Ok(config)
    }
}

/// Feeds every record from `reader` into `recorder`. Malformed lines are skipped.
fn replay<R: BufRead>(recorder: &Recorder, reader: R) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let record: IngestRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "Skipping malformed record");
                stats.skipped += 1;
                continue;
            }
        };

        let component = record
            .component
            .unwrap_or_else(|| recorder.config().component.clone());
        let mut logger = recorder.scoped(component);
        if let Some(id) = record.correlation_id {
            logger = logger.with_correlation_id(id);
        }
        logger.log(record.level, record.message, record.payload, record.error);
        stats.replayed += 1;
    }

    Ok(stats)
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = cli.recorder_config()?;
    let recorder = Recorder::new(config).context("Invalid recorder configuration")?;

    let stats = match cli.input {
        Some(ref path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            replay(&recorder, BufReader::new(file))?
        }
        None => replay(&recorder, std::io::stdin().lock())?,
    };
    tracing::info!(
        replayed = stats.replayed,
        skipped = stats.skipped,
        "Replay complete"
    );

    match cli.command {
        Commands::History { min_level, limit } => {
            let events = recorder.history(min_level, limit);
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        Commands::Metrics => {
            println!("{}", serde_json::to_string_pretty(&recorder.metrics())?);
        }
        Commands::Analyze => {
            println!("{}", serde_json::to_string_pretty(&recorder.analyze())?);
        }
        Commands::Export { format } => {
            println!("{}", recorder.export(format)?);
        }
    }

    Ok(())
}
