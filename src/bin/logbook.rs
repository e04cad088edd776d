//! Logbook CLI - Command-line interface for Logbook Metrics
//!
//! Commands:
//! - report: Compute the full dashboard report (streaks + balance)
//! - streaks: Print current and longest streaks per habit
//! - balance: Print the daily balance trend and weekly comparison
//! - activity: Print time totals, top days, and weekday averages
//! - validate: Check every habit and activity cell against its domain
//! - config: Print the default tracker configuration
//! - doctor: Diagnose configuration and environment

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use logbook_metrics::logbook::Logbook;
use logbook_metrics::types::BalanceScore;
use logbook_metrics::{
    ComputeError, DashboardProcessor, RowFormat, TrackerConfig, PRODUCER_NAME, VERSION,
};

/// Logbook - Streak and time-balance metrics for a daily habit logbook
#[derive(Parser)]
#[command(name = "logbook")]
#[command(version = VERSION)]
#[command(about = "Compute habit streaks and time balance from a daily logbook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full dashboard report
    Report {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Print current and longest streaks per habit
    Streaks {
        #[command(flatten)]
        source: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the daily balance trend and weekly comparison
    Balance {
        #[command(flatten)]
        source: SourceArgs,

        /// Trend length in days
        #[arg(long)]
        days: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print time totals, top days, and weekday averages
    Activity {
        #[command(flatten)]
        source: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check every habit and activity cell against its domain
    Validate {
        #[command(flatten)]
        source: SourceArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default tracker configuration as JSON
    Config,

    /// Diagnose configuration and environment
    Doctor {
        /// Check a tracker configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Input format (inferred from the file extension by default)
    #[arg(long, default_value = "auto")]
    input_format: InputFormat,

    /// Tracker configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Day the dashboard is computed for (YYYY-MM-DD, defaults to the local date)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Override the completion threshold of every duration habit (minutes)
    #[arg(long)]
    threshold: Option<f64>,

    /// Override the date column name
    #[arg(long)]
    date_column: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Pick from the file extension (.csv, .ndjson/.jsonl, otherwise JSON)
    Auto,
    /// JSON array of row objects
    Json,
    /// Newline-delimited JSON (one row per line)
    Ndjson,
    /// CSV with a header row
    Csv,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), LogbookCliError> {
    match cli.command {
        Commands::Report {
            source,
            output,
            output_format,
        } => cmd_report(&source, &output, output_format),

        Commands::Streaks { source, json } => cmd_streaks(&source, json),

        Commands::Balance { source, days, json } => cmd_balance(&source, days, json),

        Commands::Activity { source, json } => cmd_activity(&source, json),

        Commands::Validate { source, json } => cmd_validate(&source, json),

        Commands::Config => {
            println!("{}", TrackerConfig::default().to_json()?);
            Ok(())
        }

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

/// Everything a command needs once the source has been read
struct Loaded {
    processor: DashboardProcessor,
    logbook: Logbook,
    today: NaiveDate,
}

fn load(source: &SourceArgs) -> Result<Loaded, LogbookCliError> {
    let mut config = match &source.config {
        Some(path) => TrackerConfig::from_json(&fs::read_to_string(path)?)?,
        None => TrackerConfig::default(),
    };
    if let Some(threshold) = source.threshold {
        config = config.with_duration_threshold(threshold);
    }
    if let Some(column) = &source.date_column {
        config.date_column = column.clone();
    }

    let processor = DashboardProcessor::new(config)?;
    let today = source
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let input_data = read_input(&source.input)?;
    let format = resolve_format(source.input_format, &source.input);
    let logbook = processor.load(&input_data, format, today)?;

    if logbook.is_empty() {
        return Err(LogbookCliError::NoRows);
    }
    info!(
        "loaded {} rows ({} to {})",
        logbook.len(),
        logbook.first_date().map(|d| d.to_string()).unwrap_or_default(),
        logbook.last_date().map(|d| d.to_string()).unwrap_or_default()
    );

    Ok(Loaded {
        processor,
        logbook,
        today,
    })
}

fn read_input(input: &Path) -> Result<String, LogbookCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn resolve_format(format: InputFormat, input: &Path) -> RowFormat {
    match format {
        InputFormat::Json => RowFormat::Json,
        InputFormat::Ndjson => RowFormat::Ndjson,
        InputFormat::Csv => RowFormat::Csv,
        InputFormat::Auto => match input.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => RowFormat::Csv,
            Some(ext) if ext.eq_ignore_ascii_case("ndjson") || ext.eq_ignore_ascii_case("jsonl") => {
                RowFormat::Ndjson
            }
            _ => RowFormat::Json,
        },
    }
}

fn cmd_report(
    source: &SourceArgs,
    output: &Path,
    output_format: OutputFormat,
) -> Result<(), LogbookCliError> {
    let loaded = load(source)?;
    let report = loaded.processor.report(&loaded.logbook, loaded.today)?;

    let output_data = match output_format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
        info!("report written to {}", output.display());
    }

    Ok(())
}

fn cmd_streaks(source: &SourceArgs, json: bool) -> Result<(), LogbookCliError> {
    let loaded = load(source)?;
    let streaks = loaded.processor.streaks(&loaded.logbook)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&streaks)?);
        return Ok(());
    }

    println!("Habit Streaks (as of {})", loaded.today);
    println!("==========================");
    for habit in &streaks {
        let status = if habit.record_breaking {
            "record-breaking"
        } else if habit.current_streak > 0 {
            "active"
        } else {
            "inactive"
        };
        println!(
            "  {} {:<16} current {:>4}d   best {:>4}d   [{}]",
            habit.emoji.as_deref().unwrap_or(" "),
            habit.name,
            habit.current_streak,
            habit.longest_streak,
            status
        );
    }

    Ok(())
}

fn cmd_balance(source: &SourceArgs, days: Option<i64>, json: bool) -> Result<(), LogbookCliError> {
    let mut loaded = load(source)?;
    if let Some(days) = days {
        let mut config = loaded.processor.config().clone();
        config.trend_days = days;
        loaded.processor = DashboardProcessor::new(config)?;
    }
    let summary = loaded.processor.balance(&loaded.logbook, loaded.today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Balance (as of {})", loaded.today);
    println!("=====================");
    println!(
        "Current week average:  {:.1} ({} scored days)",
        summary.weekly.current_week_average, summary.weekly.current_week_scored_days
    );
    println!(
        "Previous week average: {:.1} ({} scored days)",
        summary.weekly.previous_week_average, summary.weekly.previous_week_scored_days
    );
    println!("Change:                {:+.1}", summary.weekly.change);

    println!("\nDaily scores:");
    for point in &summary.trend {
        let score = match point.score {
            BalanceScore::Score(s) => format!("{:5.1}", s),
            BalanceScore::NoData => "   NA".to_string(),
        };
        let average = point
            .moving_average
            .map(|a| format!("{:5.1}", a))
            .unwrap_or_else(|| "   NA".to_string());
        println!("  {}  score {}  avg {}", point.date, score, average);
    }

    println!("\nCurrent week minutes:");
    for (activity, minutes) in &summary.current_week_distribution {
        println!("  {:<16} {:>6.0}", activity, minutes);
    }

    Ok(())
}

fn cmd_activity(source: &SourceArgs, json: bool) -> Result<(), LogbookCliError> {
    let loaded = load(source)?;
    let summary = loaded.processor.activity(&loaded.logbook, loaded.today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let or_na = |v: Option<f64>| v.map(|m| format!("{:.0}", m)).unwrap_or_else(|| "NA".to_string());

    println!("Activity (as of {})", loaded.today);
    println!("======================");
    println!("Average daily total:  {} min", or_na(summary.average_daily_total));
    println!("Total hours:          {:.1}", summary.total_hours);
    if let Some(top) = &summary.top_activity {
        println!(
            "Most time spent on:   {} ({:.0} min/day)",
            top.activity, top.average_minutes
        );
    }

    let weekly = &summary.weekly;
    println!("\nThis week vs last week:");
    println!(
        "  average daily total  {:>6} min  {:+.1}%",
        or_na(weekly.current.average_daily_total),
        weekly.average_daily_total_change
    );
    println!(
        "  best day             {:>6} min  {:+.1}%",
        or_na(weekly.current.best_day.as_ref().map(|d| d.minutes)),
        weekly.best_day_change
    );
    println!(
        "  total hours          {:>6.1}      {:+.1}%",
        weekly.current.total_hours, weekly.total_hours_change
    );

    println!("\nTop days:");
    for day in &summary.top_days {
        println!("  {} {}  {:>6.0} min", day.date, day.weekday, day.minutes);
    }

    println!("\nWeekday averages (min):");
    for day in &summary.by_weekday {
        let cells: Vec<String> = day
            .averages
            .iter()
            .map(|(activity, avg)| format!("{} {}", activity, or_na(*avg)))
            .collect();
        println!("  {}  {}", day.weekday, cells.join("  "));
    }

    Ok(())
}

fn cmd_validate(source: &SourceArgs, json: bool) -> Result<(), LogbookCliError> {
    let loaded = load(source)?;
    let issues = loaded.logbook.validate(loaded.processor.config());

    let report = ValidationReport {
        total_rows: loaded.logbook.len(),
        invalid_cells: issues.len(),
        errors: issues
            .iter()
            .map(|issue| ValidationErrorDetail {
                date: issue.date.to_string(),
                column: issue.column.clone(),
                error: issue.message.clone(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total rows:    {}", report.total_rows);
        println!("Invalid cells: {}", report.invalid_cells);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} [{}]: {}", err.date, err.column, err.error);
            }
        }
    }

    if report.invalid_cells > 0 {
        Err(LogbookCliError::ValidationFailed(report.invalid_cells))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), LogbookCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", PRODUCER_NAME, VERSION),
    });

    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(config_path) {
                Ok(content) => match TrackerConfig::from_json(&content) {
                    Ok(cfg) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid ({} active habits, {} activities)",
                            cfg.active_habits().count(),
                            cfg.activities.len()
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid config: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            }
        };
        checks.push(check);
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (pass --input <file>)"
    } else {
        "stdin is a pipe (--input - ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Logbook Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(LogbookCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum LogbookCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoRows,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for LogbookCliError {
    fn from(e: io::Error) -> Self {
        LogbookCliError::Io(e)
    }
}

impl From<ComputeError> for LogbookCliError {
    fn from(e: ComputeError) -> Self {
        LogbookCliError::Compute(e)
    }
}

impl From<serde_json::Error> for LogbookCliError {
    fn from(e: serde_json::Error) -> Self {
        LogbookCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<LogbookCliError> for CliError {
    fn from(e: LogbookCliError) -> Self {
        match e {
            LogbookCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            LogbookCliError::Compute(e) => {
                let hint = match &e {
                    ComputeError::OutOfDomain(_) => "Run 'logbook validate' to list bad cells",
                    ComputeError::DateParseError(_) => "Check --date-column and the date format",
                    ComputeError::ConfigError(_) => "Run 'logbook doctor --config <file>'",
                    ComputeError::UnknownField(_) => "Check habit and activity names against the input columns",
                    _ => "Check input format",
                };
                CliError {
                    code: "COMPUTE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            LogbookCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            LogbookCliError::NoRows => CliError {
                code: "NO_ROWS".to_string(),
                message: "No logbook rows on or before the given day".to_string(),
                hint: Some("Ensure input file is not empty and --today is correct".to_string()),
            },
            LogbookCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} cells failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            LogbookCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_rows: usize,
    invalid_cells: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    date: String,
    column: String,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
