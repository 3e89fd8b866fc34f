//! Present values of BD contributions and benefits
//!
//! All sums run on the annual grid s = 0..=terminal-x from the current age x,
//! with survival sp_x and discount v^s. Contributions are paid at the start of
//! each year before retirement (s < n), benefits at the start of each year from
//! retirement to the end of the table (s >= n).
//!
//! Contributions are linear in the contribution rate, so the PV of salaries
//! is computed once and scaled; the equilibrium search then costs nothing
//! beyond a multiplication per step.

use crate::assumptions::{AssumptionSet, BenefitTarget, MortalityTable};
use crate::config::EngineConfig;
use crate::error::MortalityError;
use crate::participant::Participant;
use crate::projection::{
    ContributionProjector, ContributionSchedule, DiscountCurve, ProjectionPoint, ProjectionSeries,
};

/// Discounted, mortality-weighted building blocks for one participant
#[derive(Debug, Clone)]
pub struct BdValuation {
    /// sp_x for s = 0..=terminal-x
    survival: Vec<f64>,

    /// v^s on the same grid
    discount: Vec<f64>,

    /// Current age of the participant
    age: u32,

    schedule: ContributionSchedule,

    /// PV of annual salaries, i.e. PV of contributions at a rate of 1
    pv_salaries: f64,

    /// Sum over s >= n of v^s * sp_x
    deferred_annuity: f64,

    target: BenefitTarget,
    monthly_benefit: f64,
    annual_benefit: f64,
}

impl BdValuation {
    pub fn new(
        table: &MortalityTable,
        curve: &DiscountCurve,
        participant: &Participant,
        assumptions: &AssumptionSet,
        target: BenefitTarget,
        config: &EngineConfig,
    ) -> Result<Self, MortalityError> {
        let path = table.survival_path(participant.age)?;
        // Drop the survivors past the terminal age: no payment falls there
        let survival = path[..path.len() - 1].to_vec();
        let discount = curve.factors(survival.len());

        let schedule = ContributionProjector::from_config(config).project(participant, assumptions);
        let n = schedule.len();

        let expected_salaries: Vec<f64> = schedule
            .years()
            .iter()
            .zip(&survival)
            .map(|(year, p)| year.monthly_salary * config.installments() * p)
            .collect();
        let pv_salaries = curve.pv_stream(&expected_salaries);

        let deferred_annuity: f64 = survival
            .iter()
            .zip(&discount)
            .skip(n)
            .map(|(p, v)| v * p)
            .sum();

        let final_salary = schedule
            .final_monthly_salary()
            .unwrap_or(participant.monthly_salary);
        let monthly_benefit = target.monthly_benefit(final_salary);

        Ok(Self {
            survival,
            discount,
            age: participant.age,
            schedule,
            pv_salaries,
            deferred_annuity,
            target,
            monthly_benefit,
            annual_benefit: monthly_benefit * config.installments(),
        })
    }

    pub fn schedule(&self) -> &ContributionSchedule {
        &self.schedule
    }

    pub fn monthly_benefit(&self) -> f64 {
        self.monthly_benefit
    }

    pub fn annual_benefit(&self) -> f64 {
        self.annual_benefit
    }

    /// PV of future contributions at `contribution_rate`
    pub fn pv_contributions(&self, contribution_rate: f64) -> f64 {
        contribution_rate * self.pv_salaries
    }

    pub fn pv_benefits(&self) -> f64 {
        self.annual_benefit * self.deferred_annuity
    }

    /// accrued + PV(contributions) - PV(benefits)
    pub fn sufficiency(&self, accrued_assets: f64, contribution_rate: f64) -> f64 {
        accrued_assets + self.pv_contributions(contribution_rate) - self.pv_benefits()
    }

    /// Benefit target value equilibrating the plan at `contribution_rate`
    ///
    /// PV(benefits) is linear in the target value, so the answer is a ratio.
    pub fn equilibrium_benefit_value(&self, accrued_assets: f64, contribution_rate: f64) -> Option<f64> {
        let pv_benefits = self.pv_benefits();
        if pv_benefits <= 0.0 {
            return None;
        }
        let funding = accrued_assets + self.pv_contributions(contribution_rate);
        Some((self.target.value() * funding / pv_benefits).max(0.0))
    }

    /// Year-by-year series with the prospective reserve as fund value
    ///
    /// V_t = (PVB from t - PVC from t) / (v^t * tp_x), zero once the cohort is extinct.
    pub fn series(&self) -> ProjectionSeries {
        let n = self.schedule.len();
        let len = self.survival.len();

        let weights: Vec<f64> = self
            .survival
            .iter()
            .zip(&self.discount)
            .map(|(p, v)| p * v)
            .collect();

        // Suffix sums of discounted benefits minus contributions
        let mut remaining = vec![0.0; len + 1];
        for s in (0..len).rev() {
            let flow = if s < n {
                -self.schedule.years()[s].annual_contribution
            } else {
                self.annual_benefit
            };
            remaining[s] = remaining[s + 1] + flow * weights[s];
        }

        let reserve_at = |t: usize| {
            if weights[t] > 0.0 {
                remaining[t] / weights[t]
            } else {
                0.0
            }
        };

        let mut series = ProjectionSeries::with_capacity(len);
        for (t, year) in self.schedule.years().iter().enumerate() {
            series.push(ProjectionPoint::accumulation(year, reserve_at(t), self.survival[t]));
        }

        for t in n..len {
            series.push(ProjectionPoint::payout(
                t as u32,
                self.age + t as u32,
                self.annual_benefit,
                reserve_at(t),
                self.survival[t],
            ));
        }

        series
    }
}
