//! Pension Sim CLI
//!
//! Runs simulations and sensitivity sweeps from JSON files and prints JSON
//! results on stdout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use pension_sim::{
    Deadline, EngineConfig, Gender, NamedCsvTable, SensitivityAnalyzer, SensitivityRequest,
    SimulationOrchestrator, SimulationRequest,
};

#[derive(Parser, Debug)]
#[command(name = "pension_sim")]
#[command(about = "Actuarial simulation for defined benefit and defined contribution plans")]
struct Args {
    /// Engine configuration (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Extra mortality table as NAME=PATH to an age,female,male CSV
    #[arg(long = "mortality-csv", value_name = "NAME=PATH", global = true)]
    mortality_csv: Vec<NamedCsvTable>,

    /// Abort the calculation after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a single BD or CD request
    Simulate {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Run a sensitivity sweep
    Sensitivity {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the qx column of a mortality table
    Mortality {
        #[arg(short, long, default_value = "IAM_2012_BASIC")]
        table: String,
        #[arg(short, long)]
        gender: Gender,
    },
    /// List the registered mortality tables
    Tables,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_path(path)
            .with_context(|| format!("loading engine config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let orchestrator = SimulationOrchestrator::from_config(config, &args.mortality_csv);
    let deadline = args
        .timeout_ms
        .map(|ms| Deadline::after(Duration::from_millis(ms)))
        .unwrap_or_else(Deadline::none);

    match &args.command {
        Command::Simulate { input } => {
            let request = SimulationRequest::from_json_path(input)
                .map_err(|e| anyhow!("reading request {}: {}", input.display(), e))?;
            let result = orchestrator.simulate_with_deadline(&request, &deadline)?;
            print_json(&result, args.pretty)?;
        }
        Command::Sensitivity { input } => {
            let request = SensitivityRequest::from_json_path(input)
                .map_err(|e| anyhow!("reading sweep {}: {}", input.display(), e))?;
            let report = SensitivityAnalyzer::new(&orchestrator).analyze(&request, &deadline)?;
            print_json(&report, args.pretty)?;
        }
        Command::Mortality { table, gender } => {
            let rates = orchestrator.mortality_rates(table, *gender)?;
            print_json(&rates, args.pretty)?;
        }
        Command::Tables => {
            print_json(&orchestrator.registry().table_names(), args.pretty)?;
        }
    }

    Ok(())
}
