//! One-shot assessment of a single observation.
//!
//! Reads a JSON object with the thirteen observation keys, evaluates it and
//! prints the report as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin assess -- [--remote] [--coding cleveland|zero-based] [<file>]
//! ```
//!
//! Without a file the observation is read from stdin. Remote settings come
//! from the same `CARDIORISK_*` variables as the TUI.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::sanitize::SanitizingMakeWriter;
use cardiorisk::adapters::{HeuristicScorer, HttpPredictor};
use cardiorisk::application::AssessmentService;
use cardiorisk::config::Settings;
use cardiorisk::domain::{Coding, ObservationInput, Strategy};
use cardiorisk::CardioriskError;

const USAGE: &str = "Usage: assess [--remote] [--coding cleveland|zero-based] [<file>]";

struct Args {
    strategy: Option<Strategy>,
    coding: Coding,
    input: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        strategy: None,
        coding: Coding::Cleveland,
        input: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--remote" => parsed.strategy = Some(Strategy::Remote),
            "--local" => parsed.strategy = Some(Strategy::Local),
            "--coding" => {
                let value = args.next().unwrap_or_default();
                parsed.coding = value
                    .parse()
                    .map_err(|e| anyhow::anyhow!("{e}\n{USAGE}"))?;
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("Unknown option '{other}'\n{USAGE}"),
            path => {
                if parsed.input.is_some() {
                    bail!("Only one input file may be given\n{USAGE}");
                }
                parsed.input = Some(PathBuf::from(path));
            }
        }
    }

    Ok(parsed)
}

fn read_input(path: Option<&PathBuf>) -> Result<ObservationInput> {
    let text = match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("Input must be a JSON object with all thirteen observation keys")
}

fn run() -> Result<ExitCode> {
    let args = parse_args()?;
    let settings = Settings::from_env()?;

    // stdout carries the report; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(std::io::stderr)))
        .init();

    let input = read_input(args.input.as_ref())?;
    let strategy = args.strategy.unwrap_or(settings.strategy);

    let outcome = match strategy {
        Strategy::Local => AssessmentService::new(Arc::new(HeuristicScorer::new()))
            .assess_input(&input, args.coding),
        Strategy::Remote => {
            let predictor = HttpPredictor::from_settings(&settings)?;
            AssessmentService::new(Arc::new(predictor)).assess_input(&input, args.coding)
        }
    };

    match outcome {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(CardioriskError::Validation(errors)) => {
            for error in &errors {
                eprintln!("{error}");
            }
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}
