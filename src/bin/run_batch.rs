//! Simulate every participant of a CSV against one request template
//!
//! Writes one summary row per participant; failures are kept as rows with
//! the error message so the output lines up with the input file.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use pension_sim::participant::load_participants;
use pension_sim::{EngineConfig, NamedCsvTable, PlanType, SimulationOrchestrator, SimulationRequest, SimulationResult};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "run_batch")]
#[command(about = "Run one simulation per participant and write a summary CSV")]
struct Args {
    /// Participants CSV (id,age,gender,monthly_salary,initial_balance)
    #[arg(short, long)]
    participants: PathBuf,

    /// Request JSON whose participant is replaced row by row
    #[arg(short, long)]
    template: PathBuf,

    /// Output CSV path
    #[arg(short, long, default_value = "batch_summary.csv")]
    output: PathBuf,

    /// Engine configuration (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra mortality table as NAME=PATH to an age,female,male CSV
    #[arg(long = "mortality-csv", value_name = "NAME=PATH")]
    mortality_csv: Vec<NamedCsvTable>,
}

#[derive(Debug, Default, Serialize)]
struct SummaryRow {
    id: String,
    plan_type: String,
    rmba: Option<f64>,
    pv_contributions: Option<f64>,
    pv_benefits: Option<f64>,
    sufficiency: Option<f64>,
    sufficiency_status: Option<String>,
    suggested_contribution_rate: Option<f64>,
    projected_balance: Option<f64>,
    monthly_income: Option<f64>,
    life_expectancy: Option<f64>,
    error: Option<String>,
}

impl SummaryRow {
    fn from_result(id: &str, result: &SimulationResult) -> Self {
        let mut row = SummaryRow {
            id: id.to_string(),
            plan_type: result.plan_type().code().to_string(),
            life_expectancy: Some(result.life_expectancy),
            ..Default::default()
        };
        if let Some(bd) = result.as_bd() {
            row.rmba = Some(bd.rmba);
            row.pv_contributions = Some(bd.pv_contributions);
            row.pv_benefits = Some(bd.pv_benefits);
            row.sufficiency = Some(bd.sufficiency);
            row.sufficiency_status = Some(bd.sufficiency_status.as_str().to_string());
            row.suggested_contribution_rate = bd.suggested_contribution_rate;
        }
        if let Some(cd) = result.as_cd() {
            row.projected_balance = Some(cd.projected_balance);
            row.monthly_income = Some(cd.monthly_income);
        }
        row
    }

    fn failed(id: &str, plan_type: &str, error: String) -> Self {
        SummaryRow {
            id: id.to_string(),
            plan_type: plan_type.to_string(),
            error: Some(error),
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let start = Instant::now();

    println!("Loading participants from {}...", args.participants.display());
    let participants = load_participants(&args.participants)
        .map_err(|e| anyhow!("loading {}: {}", args.participants.display(), e))?;
    println!("Loaded {} participants in {:?}", participants.len(), start.elapsed());

    let template = SimulationRequest::from_json_path(&args.template)
        .map_err(|e| anyhow!("loading template {}: {}", args.template.display(), e))?;
    let plan_code = template.plan_type.code();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_path(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let orchestrator = SimulationOrchestrator::from_config(config, &args.mortality_csv);

    println!("Running simulations...");
    let sim_start = Instant::now();

    let rows: Vec<SummaryRow> = participants
        .par_iter()
        .map(|entry| {
            let request = template.for_participant(entry.participant.clone());
            match orchestrator.simulate(&request) {
                Ok(result) => SummaryRow::from_result(&entry.id, &result),
                Err(e) => SummaryRow::failed(&entry.id, plan_code, e.to_string()),
            }
        })
        .collect();

    println!("Simulations complete in {:?}", sim_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!("Output written to {}", args.output.display());

    let failed = rows.iter().filter(|r| r.error.is_some()).count();
    println!("\nBatch Summary:");
    println!("  Participants: {}", rows.len());
    println!("  Failed:       {}", failed);
    if template.plan_type == PlanType::DefinedBenefit {
        let total_rmba: f64 = rows.iter().filter_map(|r| r.rmba).sum();
        let deficits = rows
            .iter()
            .filter(|r| r.sufficiency_status.as_deref() == Some("deficit"))
            .count();
        println!("  Total RMBA:   ${:.0}", total_rmba);
        println!("  In deficit:   {}", deficits);
    } else {
        let total_balance: f64 = rows.iter().filter_map(|r| r.projected_balance).sum();
        println!("  Total projected balance: ${:.0}", total_balance);
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
