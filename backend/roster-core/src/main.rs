// src/main.rs
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roster_core::{
    validate_batch, AppConfig, CancellationFlag, Holidays, RuleBook, ScheduleMetadata,
    ScheduleSource, ScheduleValidator, TimeSheet, WorkSchedule,
};

/// Checks monthly shift rosters before timesheets are produced
#[derive(Parser, Debug)]
#[command(name = "roster-validator")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate one or more rosters stored as JSON
    Validate {
        /// Path to a roster JSON file (repeatable)
        #[arg(long = "schedule", required = true)]
        schedules: Vec<PathBuf>,

        /// Rule overrides; falls back to ROSTER_RULES_PATH, then built-in rules
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Public holidays, comma separated (YYYY-MM-DD)
        #[arg(long, value_delimiter = ',')]
        holidays: Vec<NaiveDate>,

        /// Log a payroll summary per employee for every valid roster
        #[arg(long)]
        summary: bool,
    },

    /// Print the effective validation rules as JSON
    Rules {
        /// Rule overrides; falls back to ROSTER_RULES_PATH, then built-in rules
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn init_tracing(config: &AppConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_rule_book(config: &AppConfig, rules: Option<PathBuf>) -> Result<RuleBook> {
    match rules {
        Some(path) => RuleBook::load(&path)
            .with_context(|| format!("Failed to load rules from {}", path.display())),
        None => config
            .rule_book()
            .context("Failed to load configured rules"),
    }
}

fn load_schedule(path: &Path, rule_book: &RuleBook) -> Result<WorkSchedule> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schedule {}", path.display()))?;
    let schedule: WorkSchedule = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse schedule {}", path.display()))?;
    let schedule = schedule.with_metadata(ScheduleMetadata {
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        source: ScheduleSource::File,
        read_at: Utc::now(),
    });

    info!(
        "Loaded schedule {} ({:?}): {} shifts for {} / {} ({:?}, {})",
        schedule.metadata.name,
        schedule.metadata.source,
        schedule.shifts.len(),
        schedule.company,
        schedule.location,
        schedule.schedule_type,
        schedule.year_month
    );

    // A rule embedded in the file wins over the rule book.
    if schedule.rule.is_some() {
        Ok(schedule)
    } else {
        Ok(schedule.with_rule_from(rule_book))
    }
}

fn print_rules(config: &AppConfig, rules: Option<PathBuf>) -> Result<bool> {
    let book = load_rule_book(config, rules)?;
    for (schedule_type, rule) in book.rules() {
        info!("Rule for {:?}: {:?}", schedule_type, rule);
    }
    let json = book.to_json_string()?;
    println!("{}", json);
    Ok(true)
}

async fn validate(
    config: &AppConfig,
    paths: Vec<PathBuf>,
    rules: Option<PathBuf>,
    holidays: Holidays,
    summary: bool,
) -> Result<bool> {
    let rule_book = load_rule_book(config, rules)?;
    let schedules = paths
        .iter()
        .map(|path| load_schedule(path, &rule_book))
        .collect::<Result<Vec<_>>>()?;

    let cancel = CancellationFlag::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling validation...");
            ctrl_c_cancel.cancel();
        }
    });

    let results = validate_batch(ScheduleValidator::new(), schedules, cancel).await?;

    let mut all_valid = true;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(validated) => {
                info!("Schedule {} is valid", path.display());
                if summary {
                    for sheet in TimeSheet::split(&validated) {
                        let totals = sheet.summarize(&holidays);
                        info!(
                            "Time sheet for {} ({}): {}",
                            sheet.employee,
                            path.display(),
                            serde_json::to_string(&totals)?
                        );
                    }
                }
            }
            Err(e) => {
                all_valid = false;
                error!(
                    "Schedule {} is invalid [{:?}]: {}",
                    path.display(),
                    e.kind(),
                    e
                );
            }
        }
    }
    Ok(all_valid)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    let outcome = match cli.command {
        Command::Validate {
            schedules,
            rules,
            holidays,
            summary,
        } => validate(&config, schedules, rules, Holidays::new(holidays), summary).await,
        Command::Rules { rules } => print_rules(&config, rules),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!("roster-validator failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
