//! Convopt - LLC and boost PFC converter design optimizer
//!
//! Reads a component catalog directory and a flat JSON design request, runs
//! the optimizer for the chosen topology and prints the outcome as JSON.
//!
//! # Usage
//!
//! ```bash
//! convopt llc --catalog ./catalog --request llc.json --pretty > report.json
//! RUST_LOG=convopt_core=debug convopt pfc --catalog ./catalog --request - < pfc.json
//! ```
//!
//! The exit status is 2 when no feasible design exists and no fallback was
//! requested.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use convopt_core::{
    error::{ConvoptError, Result},
    ComponentCatalog, InfeasiblePolicy, LlcOptimizer, LlcRequest, OptimizerConfig, Outcome, PfcOptimizer,
    PfcRequest,
};

/// Exit status reported for an infeasible design space.
const EXIT_INFEASIBLE: u8 = 2;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Topology {
    /// Full-bridge LLC resonant converter
    Llc,
    /// Boost power-factor-correction stage
    Pfc,
}

/// Power converter design-space optimizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Converter topology to optimize
    #[arg(value_enum)]
    topology: Topology,

    /// Directory holding the catalog JSON files
    #[arg(short, long, value_name = "DIR")]
    catalog: PathBuf,

    /// Flat JSON design request, or `-` for stdin
    #[arg(short, long, value_name = "FILE")]
    request: PathBuf,

    /// What to report when no candidate is feasible
    #[arg(long, value_enum, default_value_t = InfeasiblePolicy::Report)]
    policy: InfeasiblePolicy,

    /// Number of FETs and cores kept per catalog after ranking
    #[arg(long, default_value_t = convopt_core::optimizer::DEFAULT_SHORTLIST)]
    shortlist: usize,

    /// Minimum acceptable efficiency in percent
    #[arg(long, default_value_t = convopt_core::optimizer::DEFAULT_MIN_EFFICIENCY)]
    min_efficiency: f64,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    info!("convopt v{}", env!("CARGO_PKG_VERSION"));

    let catalog = ComponentCatalog::from_dir(&args.catalog)?;
    let request = read_request(&args.request)?;

    let config = OptimizerConfig::new()
        .with_shortlist(args.shortlist)
        .with_min_efficiency(args.min_efficiency)
        .with_policy(args.policy);
    debug!(?config, "optimizer configuration");

    let outcome = match args.topology {
        Topology::Llc => LlcOptimizer::new(&catalog)
            .with_config(config)
            .run(&LlcRequest::from_value(&request)?),
        Topology::Pfc => PfcOptimizer::new(&catalog)
            .with_config(config)
            .run(&PfcRequest::from_value(&request)?),
    };

    write_outcome(&outcome, args.pretty)?;

    if let Outcome::Infeasible(stats) = &outcome {
        warn!("{stats}");
        return Ok(ExitCode::from(EXIT_INFEASIBLE));
    }
    Ok(ExitCode::SUCCESS)
}

fn read_request(path: &Path) -> Result<Value> {
    let display = path.display().to_string();
    let text = if display == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|source| ConvoptError::RequestRead { path: display.clone(), source })?;
        text
    } else {
        fs::read_to_string(path).map_err(|source| ConvoptError::RequestRead { path: display.clone(), source })?
    };
    serde_json::from_str(&text).map_err(|e| ConvoptError::request(format!("'{display}' is not valid JSON: {e}")))
}

fn write_outcome(outcome: &Outcome, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(outcome)
    } else {
        serde_json::to_string(outcome)
    }
    .map_err(|source| ConvoptError::ReportSerialize { source })?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").map_err(|source| ConvoptError::ReportWrite { source })
}
