use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use qudratak_core::model::{Category, ExamDefaults, TestConfiguration};
use services::blob::{parse_configuration, parse_question_bank};
use services::{Clock, ExamService, SelectionPolicy};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use console::ReviewScope;

mod console;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidCategory { raw: String },
    InvalidMode { raw: String },
    InvalidReview { raw: String },
    CountsNeedCustomMode { mode: String },
    MissingPool,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidCategory { raw } => write!(f, "invalid --category value: {raw}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
            ArgsError::InvalidReview { raw } => write!(f, "invalid --review value: {raw}"),
            ArgsError::CountsNeedCustomMode { mode } => write!(
                f,
                "--verbal/--quantitative/--minutes only apply to custom tests, not --mode {mode}"
            ),
            ArgsError::MissingPool => write!(f, "no question bank given (use --pool or QUDRATAK_POOL)"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_number(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<u32, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  qudratak run   --pool <bank.json> [--config <config.json>]");
    eprintln!("                 [--mode standard|custom|qiyas] [--category verbal|quantitative]");
    eprintln!("                 [--verbal <n>] [--quantitative <n>] [--minutes <m>]");
    eprintln!("                 [--shuffle] [--review errors|all] [--json]");
    eprintln!("  qudratak stats --pool <bank.json>");
    eprintln!();
    eprintln!("Defaults for run:");
    eprintln!("  --mode standard --category verbal --review errors");
    eprintln!("  custom counts not given: 20 verbal, 20 quantitative, 30 minutes");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUDRATAK_POOL  question bank path");
    eprintln!("  QUDRATAK_LOG   log filter (default: warn)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Stats,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

/// Where the test configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfigSource {
    File(PathBuf),
    Standard(Category),
    Custom {
        verbal: u32,
        quantitative: u32,
        minutes: u32,
    },
    Qiyas,
}

#[derive(Debug)]
struct Args {
    pool: Option<PathBuf>,
    config: ConfigSource,
    shuffle: bool,
    review: ReviewScope,
    json: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut pool = std::env::var("QUDRATAK_POOL").ok().map(PathBuf::from);
        let mut config_file = None;
        let mut mode = None;
        let mut category = Category::Verbal;
        let mut verbal = None;
        let mut quantitative = None;
        let mut minutes = None;
        let mut shuffle = false;
        let mut review = ReviewScope::Errors;
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--pool" => pool = Some(PathBuf::from(require_value(args, "--pool")?)),
                "--config" => config_file = Some(PathBuf::from(require_value(args, "--config")?)),
                "--mode" => mode = Some(require_value(args, "--mode")?),
                "--category" => {
                    let raw = require_value(args, "--category")?;
                    category = raw
                        .parse()
                        .map_err(|_| ArgsError::InvalidCategory { raw: raw.clone() })?;
                }
                "--verbal" => verbal = Some(require_number(args, "--verbal")?),
                "--quantitative" => quantitative = Some(require_number(args, "--quantitative")?),
                "--minutes" => minutes = Some(require_number(args, "--minutes")?),
                "--shuffle" => shuffle = true,
                "--review" => {
                    review = match require_value(args, "--review")?.as_str() {
                        "errors" => ReviewScope::Errors,
                        "all" => ReviewScope::All,
                        raw => return Err(ArgsError::InvalidReview { raw: raw.to_owned() }),
                    };
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        // Any explicit count implies a custom test.
        let has_counts = verbal.is_some() || quantitative.is_some() || minutes.is_some();
        let mode = match mode {
            Some(mode) if has_counts && mode != "custom" => {
                return Err(ArgsError::CountsNeedCustomMode { mode });
            }
            Some(mode) => mode,
            None if has_counts => String::from("custom"),
            None => String::from("standard"),
        };

        let config = if let Some(path) = config_file {
            ConfigSource::File(path)
        } else {
            match mode.as_str() {
                "standard" => ConfigSource::Standard(category),
                "custom" => {
                    let defaults = ExamDefaults::default();
                    ConfigSource::Custom {
                        verbal: verbal.unwrap_or(defaults.verbal_questions()),
                        quantitative: quantitative.unwrap_or(defaults.quantitative_questions()),
                        minutes: minutes.unwrap_or(defaults.duration_minutes()),
                    }
                }
                "qiyas" => ConfigSource::Qiyas,
                _ => return Err(ArgsError::InvalidMode { raw: mode }),
            }
        };

        Ok(Self {
            pool,
            config,
            shuffle,
            review,
            json,
        })
    }

    fn pool_path(&self) -> Result<&PathBuf, ArgsError> {
        self.pool.as_ref().ok_or(ArgsError::MissingPool)
    }
}

fn load_configuration(source: &ConfigSource) -> Result<TestConfiguration, Box<dyn std::error::Error>> {
    let config = match source {
        ConfigSource::File(path) => parse_configuration(&std::fs::read_to_string(path)?)?,
        ConfigSource::Standard(category) => TestConfiguration::standard(*category),
        ConfigSource::Custom {
            verbal,
            quantitative,
            minutes,
        } => custom_configuration(*verbal, *quantitative, *minutes)?,
        ConfigSource::Qiyas => TestConfiguration::qiyas(),
    };
    Ok(config)
}

/// Custom counts from the command line, held to the same rules as the
/// administrator defaults.
fn custom_configuration(
    verbal: u32,
    quantitative: u32,
    minutes: u32,
) -> Result<TestConfiguration, qudratak_core::Error> {
    Ok(ExamDefaults::new(verbal, quantitative, minutes)?.custom_test()?)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("QUDRATAK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: run a test when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let bank = std::fs::read_to_string(parsed.pool_path()?)?;
    let pool = parse_question_bank(&bank)?;

    match cmd {
        Command::Stats => {
            let stats = pool.stats();
            if parsed.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("total:        {}", stats.total);
                println!("verbal:       {}", stats.verbal);
                println!("quantitative: {}", stats.quantitative);
            }
            Ok(())
        }
        Command::Run => {
            let config = load_configuration(&parsed.config)?;
            let service = ExamService::new(Clock::system(), Arc::new(pool));
            let policy = if parsed.shuffle {
                SelectionPolicy::ShuffleUnseen {
                    seen: Default::default(),
                }
            } else {
                SelectionPolicy::InPoolOrder
            };

            let exam = match service.start_timed(&config, policy) {
                Ok(exam) => exam,
                Err(err) if err.is_recoverable() => {
                    // Nothing was started; report and go back.
                    println!("{err}");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };

            let stdin = BufReader::new(tokio::io::stdin());
            let Some((session, result)) = console::run_attempt(&service, exam, stdin).await? else {
                println!("attempt abandoned");
                return Ok(());
            };
            if parsed.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                console::print_result(&session, &result, parsed.review);
            }
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
