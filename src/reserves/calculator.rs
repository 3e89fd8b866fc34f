//! BD reserve calculator
//!
//! Values the benefit target against the contribution stream, classifies the
//! funding position and, outside equilibrium, searches for the contribution
//! rate and the benefit value that restore it.
//!
//! # Conventions
//!
//! - RMBA is the prospective reserve PV(benefits) - PV(future contributions),
//!   both annuity-due from the current age.
//! - The participant's initial balance counts as assets already accrued, so
//!   sufficiency = accrued + PV(contributions) - PV(benefits).
//! - The equilibrium band is ±max(tolerance * PV(benefits), floor).

use log::{debug, warn};

use super::solver::bisect_increasing;
use super::types::{BdResult, SufficiencyStatus};
use super::valuation::BdValuation;
use crate::assumptions::{AssumptionSet, MortalityTable, PlanAssumptions};
use crate::config::EngineConfig;
use crate::deadline::Deadline;
use crate::error::{EngineResult, ValidationErrors};
use crate::participant::Participant;
use crate::projection::DiscountCurve;

/// Suggested contribution rate and how it was found
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct ContributionSuggestion {
    rate: Option<f64>,
    no_equilibrium_found: bool,
    iterations: u32,
}

impl ContributionSuggestion {
    fn found(rate: f64, iterations: u32) -> Self {
        Self {
            rate: Some(rate),
            no_equilibrium_found: false,
            iterations,
        }
    }

    fn unreachable() -> Self {
        Self {
            rate: None,
            no_equilibrium_found: true,
            iterations: 0,
        }
    }
}

/// Calculator for defined-benefit plans
pub struct BdReserveCalculator<'a> {
    table: &'a MortalityTable,
    config: &'a EngineConfig,
}

impl<'a> BdReserveCalculator<'a> {
    pub fn new(table: &'a MortalityTable, config: &'a EngineConfig) -> Self {
        Self { table, config }
    }

    /// Half-width of the equilibrium band for a given PV(benefits)
    pub fn equilibrium_tolerance(&self, pv_benefits: f64) -> f64 {
        (self.config.equilibrium_tolerance * pv_benefits.abs()).max(self.config.equilibrium_floor)
    }

    /// Value the plan for `participant`
    pub fn calculate(
        &self,
        participant: &Participant,
        assumptions: &AssumptionSet,
        deadline: &Deadline,
    ) -> EngineResult<BdResult> {
        let target = match assumptions.plan() {
            PlanAssumptions::DefinedBenefit { benefit_target } => *benefit_target,
            PlanAssumptions::DefinedContribution { .. } => {
                let mut errors = ValidationErrors::new();
                errors.push("plan_type", "BD valuation needs BD assumptions");
                return Err(errors.into());
            }
        };

        let curve = DiscountCurve::single_rate(assumptions.discount_rate());
        let valuation = BdValuation::new(self.table, &curve, participant, assumptions, target, self.config)?;

        let rate = assumptions.contribution_rate();
        let accrued_assets = participant.initial_balance;
        let pv_contributions = valuation.pv_contributions(rate);
        let pv_benefits = valuation.pv_benefits();
        let sufficiency = valuation.sufficiency(accrued_assets, rate);
        let tolerance = self.equilibrium_tolerance(pv_benefits);
        let status = SufficiencyStatus::classify(sufficiency, tolerance);

        let suggestion = self.suggest_contribution_rate(&valuation, accrued_assets, rate, status, tolerance, deadline)?;

        let suggested_benefit_value = match status {
            SufficiencyStatus::Equilibrium => None,
            _ => valuation.equilibrium_benefit_value(accrued_assets, rate),
        };

        let annuity_factor_at_retirement = curve.life_annuity_due(self.table, assumptions.retirement_age())?;

        debug!(
            "BD valuation: PVB {:.2}, PVC {:.2}, sufficiency {:.2} ({}), suggested rate {:?}",
            pv_benefits, pv_contributions, sufficiency, status, suggestion.rate
        );

        Ok(BdResult {
            rmba: pv_benefits - pv_contributions,
            pv_contributions,
            pv_benefits,
            accrued_assets,
            monthly_benefit: valuation.monthly_benefit(),
            sufficiency,
            sufficiency_status: status,
            equilibrium_tolerance: tolerance,
            suggested_contribution_rate: suggestion.rate,
            suggested_benefit_value,
            no_equilibrium_found: suggestion.no_equilibrium_found,
            solver_iterations: suggestion.iterations,
            annuity_factor_at_retirement,
            projection_series: valuation.series(),
        })
    }

    /// Bisection over the contribution rate
    ///
    /// In deficit the bracket is [current, max_contribution_rate]; in surplus
    /// it is [0, current] and the result is the lowest rate still in
    /// equilibrium. The search stops inside half the band so a re-run at the
    /// suggested rate classifies as equilibrium.
    fn suggest_contribution_rate(
        &self,
        valuation: &BdValuation,
        accrued_assets: f64,
        current_rate: f64,
        status: SufficiencyStatus,
        tolerance: f64,
        deadline: &Deadline,
    ) -> EngineResult<ContributionSuggestion> {
        let sufficiency_at = |rate: f64| valuation.sufficiency(accrued_assets, rate);
        let target = 0.5 * tolerance;

        let (lo, hi) = match status {
            SufficiencyStatus::Equilibrium => return Ok(ContributionSuggestion::default()),
            SufficiencyStatus::Deficit => {
                let hi = self.config.max_contribution_rate.max(current_rate);
                let at_max = sufficiency_at(hi);
                if at_max < -tolerance {
                    debug!(
                        "no equilibrium: sufficiency at {:.4} is still {:.2}",
                        hi, at_max
                    );
                    return Ok(ContributionSuggestion::unreachable());
                }
                if at_max <= target {
                    return Ok(ContributionSuggestion::found(hi, 0));
                }
                (current_rate, hi)
            }
            SufficiencyStatus::Surplus => {
                let at_zero = sufficiency_at(0.0);
                if at_zero > tolerance {
                    // Accrued assets alone over-fund the benefit
                    return Ok(ContributionSuggestion::default());
                }
                if at_zero >= -target {
                    return Ok(ContributionSuggestion::found(0.0, 0));
                }
                (0.0, current_rate)
            }
        };

        let outcome = bisect_increasing(
            sufficiency_at,
            lo,
            hi,
            target,
            self.config.solver_max_iterations,
            deadline,
        )?;

        if !outcome.converged() {
            warn!(
                "contribution rate search did not converge in {} iterations, using {:.6}",
                outcome.iterations(),
                outcome.root()
            );
        }

        Ok(ContributionSuggestion::found(outcome.root(), outcome.iterations()))
    }
}
