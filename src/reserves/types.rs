//! Result types for BD reserve calculations

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::projection::ProjectionSeries;

/// Funding position of a BD plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SufficiencyStatus {
    /// Funding falls short of the benefit by more than the tolerance
    Deficit,
    /// Funding exceeds the benefit by more than the tolerance
    Surplus,
    Equilibrium,
}

impl SufficiencyStatus {
    /// Classify a sufficiency amount against the equilibrium band [-tolerance, tolerance]
    pub fn classify(sufficiency: f64, tolerance: f64) -> Self {
        if sufficiency < -tolerance {
            SufficiencyStatus::Deficit
        } else if sufficiency > tolerance {
            SufficiencyStatus::Surplus
        } else {
            SufficiencyStatus::Equilibrium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SufficiencyStatus::Deficit => "deficit",
            SufficiencyStatus::Surplus => "surplus",
            SufficiencyStatus::Equilibrium => "equilibrium",
        }
    }
}

impl fmt::Display for SufficiencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a BD valuation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BdResult {
    /// Prospective reserve: PV(benefits) - PV(future contributions)
    pub rmba: f64,

    pub pv_contributions: f64,
    pub pv_benefits: f64,

    /// Assets already accrued to the participant (initial balance)
    pub accrued_assets: f64,

    /// Resolved monthly benefit target
    pub monthly_benefit: f64,

    /// accrued_assets + PV(contributions) - PV(benefits)
    pub sufficiency: f64,
    pub sufficiency_status: SufficiencyStatus,

    /// Half-width of the equilibrium band used for classification
    pub equilibrium_tolerance: f64,

    /// Contribution rate that brings the plan into equilibrium
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_contribution_rate: Option<f64>,

    /// Benefit target value (same mode as the input) that equilibrates the
    /// plan at the current contribution rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_benefit_value: Option<f64>,

    /// Even the maximum contribution rate leaves a deficit
    pub no_equilibrium_found: bool,

    pub solver_iterations: u32,

    /// Life annuity-due factor at retirement age
    pub annuity_factor_at_retirement: f64,

    pub projection_series: ProjectionSeries,
}
