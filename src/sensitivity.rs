//! Sensitivity analysis over a grid of assumption changes
//!
//! Takes a base request and a list of parameter axes, re-runs the full
//! pipeline for every combination in the cartesian product and reports each
//! scenario against the base case. The grid size is checked against the
//! configured ceiling before anything is computed.
//!
//! # Example
//! ```ignore
//! let analyzer = SensitivityAnalyzer::new(&orchestrator);
//! let report = analyzer.analyze(&request, &Deadline::after(Duration::from_secs(5)))?;
//! for row in &report.rows {
//!     println!("{:?} -> {:?}", row.combination, row.result_delta);
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::deadline::Deadline;
use crate::error::{EngineError, EngineResult};
use crate::simulation::{SimulationOrchestrator, SimulationRequest, SimulationSummary, SummaryDelta};

/// Assumption or participant field a sweep can vary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityParameter {
    DiscountRate,
    SalaryGrowthRate,
    ContributionRate,
    /// Whole years only
    RetirementAge,
    BenefitTargetValue,
    InvestmentReturnRate,
    MonthlySalary,
    InitialBalance,
}

impl SensitivityParameter {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensitivityParameter::DiscountRate => "discount_rate",
            SensitivityParameter::SalaryGrowthRate => "salary_growth_rate",
            SensitivityParameter::ContributionRate => "contribution_rate",
            SensitivityParameter::RetirementAge => "retirement_age",
            SensitivityParameter::BenefitTargetValue => "benefit_target_value",
            SensitivityParameter::InvestmentReturnRate => "investment_return_rate",
            SensitivityParameter::MonthlySalary => "monthly_salary",
            SensitivityParameter::InitialBalance => "initial_balance",
        }
    }

    /// Overwrite this parameter in `request`
    fn apply(&self, request: &mut SimulationRequest, value: f64) {
        let assumptions = &mut request.assumptions;
        match self {
            SensitivityParameter::DiscountRate => assumptions.discount_rate = value,
            SensitivityParameter::SalaryGrowthRate => assumptions.salary_growth_rate = value,
            SensitivityParameter::ContributionRate => assumptions.contribution_rate = value,
            SensitivityParameter::RetirementAge => assumptions.retirement_age = value as u32,
            SensitivityParameter::BenefitTargetValue => assumptions.benefit_target_value = Some(value),
            SensitivityParameter::InvestmentReturnRate => assumptions.investment_return_rate = Some(value),
            SensitivityParameter::MonthlySalary => request.participant.monthly_salary = value,
            SensitivityParameter::InitialBalance => request.participant.initial_balance = value,
        }
    }
}

impl fmt::Display for SensitivityParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One axis of the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityAxis {
    pub parameter: SensitivityParameter,
    pub candidate_values: Vec<f64>,
}

/// Base request plus the axes to sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRequest {
    pub base: SimulationRequest,
    pub axes: Vec<SensitivityAxis>,
}

impl SensitivityRequest {
    /// Read a sweep definition from a JSON file
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// A parameter set to a value in one combination
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterValue {
    pub parameter: SensitivityParameter,
    pub value: f64,
}

/// Outcome of one combination: a delta against the base case, or the error
/// that stopped it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityRow {
    pub combination: Vec<ParameterValue>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_delta: Option<SummaryDelta>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SimulationSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SensitivityRow {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Full sweep output, rows in cartesian-product order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityReport {
    pub base: SimulationSummary,
    pub combinations: usize,
    pub rows: Vec<SensitivityRow>,
}

impl SensitivityReport {
    pub fn failed(&self) -> usize {
        self.rows.iter().filter(|row| !row.is_ok()).count()
    }
}

/// Runs sensitivity sweeps against an orchestrator
pub struct SensitivityAnalyzer<'a> {
    orchestrator: &'a SimulationOrchestrator,
}

impl<'a> SensitivityAnalyzer<'a> {
    pub fn new(orchestrator: &'a SimulationOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Number of combinations in the grid, `None` on overflow
    pub fn combination_count(axes: &[SensitivityAxis]) -> Option<usize> {
        axes.iter()
            .try_fold(1usize, |acc, axis| acc.checked_mul(axis.candidate_values.len()))
    }

    /// Evaluate every combination of `request.axes`
    ///
    /// Combinations fail independently and are reported per row. Only an
    /// invalid grid, a failing base case or an expired deadline abort the
    /// whole sweep.
    pub fn analyze(&self, request: &SensitivityRequest, deadline: &Deadline) -> EngineResult<SensitivityReport> {
        check_axes(&request.axes)?;

        let limit = self.orchestrator.config().max_sensitivity_combinations;
        let count = Self::combination_count(&request.axes).unwrap_or(usize::MAX);
        if count > limit {
            return Err(EngineError::TooManyCombinations {
                requested: count,
                limit,
            });
        }

        let base = self
            .orchestrator
            .simulate_with_deadline(&request.base, deadline)?
            .summary();

        match deadline.remaining() {
            Some(left) => info!(
                "Sensitivity sweep: {} combinations over {} axes, {:?} left",
                count,
                request.axes.len(),
                left
            ),
            None => info!(
                "Sensitivity sweep: {} combinations over {} axes",
                count,
                request.axes.len()
            ),
        }

        let combinations = cartesian_product(&request.axes);
        let evaluate = |combination: Vec<ParameterValue>| self.evaluate(request, combination, &base, deadline);

        let rows: EngineResult<Vec<SensitivityRow>> = if self.orchestrator.config().parallel_sensitivity {
            combinations.into_par_iter().map(evaluate).collect()
        } else {
            combinations.into_iter().map(evaluate).collect()
        };

        let report = SensitivityReport {
            base,
            combinations: count,
            rows: rows?,
        };
        if report.failed() > 0 {
            warn!("{} of {} combinations failed", report.failed(), count);
        }
        Ok(report)
    }

    fn evaluate(
        &self,
        request: &SensitivityRequest,
        combination: Vec<ParameterValue>,
        base: &SimulationSummary,
        deadline: &Deadline,
    ) -> EngineResult<SensitivityRow> {
        deadline.check()?;

        let mut scenario = request.base.clone();
        for pv in &combination {
            pv.parameter.apply(&mut scenario, pv.value);
        }

        match self.orchestrator.simulate_with_deadline(&scenario, deadline) {
            Ok(result) => {
                let summary = result.summary();
                Ok(SensitivityRow {
                    result_delta: summary.delta(base),
                    summary: Some(summary),
                    error: None,
                    combination,
                })
            }
            Err(EngineError::DeadlineExceeded) => Err(EngineError::DeadlineExceeded),
            Err(e) => {
                warn!("Combination {:?} failed: {}", combination, e);
                Ok(SensitivityRow {
                    combination,
                    result_delta: None,
                    summary: None,
                    error: Some(e.to_string()),
                })
            }
        }
    }
}

fn check_axes(axes: &[SensitivityAxis]) -> EngineResult<()> {
    let invalid = |parameter: &str, reason: &str| {
        Err(EngineError::InvalidAxis {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        })
    };

    if axes.is_empty() {
        return invalid("axes", "at least one axis is required");
    }

    let mut seen = HashSet::new();
    for axis in axes {
        let name = axis.parameter.as_str();
        if !seen.insert(axis.parameter) {
            return invalid(name, "parameter appears on more than one axis");
        }
        if axis.candidate_values.is_empty() {
            return invalid(name, "no candidate values");
        }
        if axis.candidate_values.iter().any(|v| !v.is_finite()) {
            return invalid(name, "candidate values must be finite");
        }
        if axis.parameter == SensitivityParameter::RetirementAge
            && axis
                .candidate_values
                .iter()
                .any(|v| *v < 0.0 || v.fract() != 0.0 || *v > u32::MAX as f64)
        {
            return invalid(name, "retirement ages must be whole years");
        }
    }
    Ok(())
}

/// Every combination of axis values, last axis varying fastest
fn cartesian_product(axes: &[SensitivityAxis]) -> Vec<Vec<ParameterValue>> {
    let mut combinations: Vec<Vec<ParameterValue>> = vec![Vec::new()];
    for axis in axes {
        combinations = combinations
            .into_iter()
            .flat_map(|prefix| {
                axis.candidate_values.iter().map(move |&value| {
                    let mut combination = prefix.clone();
                    combination.push(ParameterValue {
                        parameter: axis.parameter,
                        value,
                    });
                    combination
                })
            })
            .collect();
    }
    combinations
}
