//! Salary and contribution schedule up to retirement
//!
//! Year t runs from age x+t to x+t+1. Salary grows once a year:
//! `salary[t+1] = salary[t] * (1 + g)`. Contributions are a fixed share of
//! salary, paid `installments_per_year` times a year and treated as a single
//! payment at the start of the year.

use serde::Serialize;

use crate::assumptions::AssumptionSet;
use crate::config::EngineConfig;
use crate::participant::Participant;

/// One accumulation year of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContributionYear {
    pub year_offset: u32,
    pub age: u32,
    pub monthly_salary: f64,
    pub monthly_contribution: f64,
    pub annual_contribution: f64,
}

/// Contribution schedule from the current age to the year before retirement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContributionSchedule {
    years: Vec<ContributionYear>,
}

impl ContributionSchedule {
    pub fn years(&self) -> &[ContributionYear] {
        &self.years
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Monthly salary in the last working year (age R-1)
    pub fn final_monthly_salary(&self) -> Option<f64> {
        self.years.last().map(|y| y.monthly_salary)
    }

    /// Annual contributions in schedule order
    /// Undiscounted sum of all contributions
    pub fn total_contributions(&self) -> f64 {
        self.years.iter().map(|y| y.annual_contribution).sum()
    }
}

/// Projects salaries and contributions year by year
#[derive(Debug, Clone, Copy)]
pub struct ContributionProjector {
    installments_per_year: f64,
}

impl ContributionProjector {
    pub fn new(installments_per_year: u32) -> Self {
        Self {
            installments_per_year: installments_per_year as f64,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            installments_per_year: config.installments(),
        }
    }

    /// Schedule for ages `participant.age..retirement_age`
    pub fn project(&self, participant: &Participant, assumptions: &AssumptionSet) -> ContributionSchedule {
        self.project_with_rate(participant, assumptions, assumptions.contribution_rate())
    }

    /// Same schedule with the contribution rate overridden
    pub fn project_with_rate(
        &self,
        participant: &Participant,
        assumptions: &AssumptionSet,
        contribution_rate: f64,
    ) -> ContributionSchedule {
        let n = participant.years_to(assumptions.retirement_age());
        let growth = 1.0 + assumptions.salary_growth_rate();

        let mut years = Vec::with_capacity(n as usize);
        let mut salary = participant.monthly_salary;
        for t in 0..n {
            let monthly_contribution = salary * contribution_rate;
            years.push(ContributionYear {
                year_offset: t,
                age: participant.attained_age(t),
                monthly_salary: salary,
                monthly_contribution,
                annual_contribution: monthly_contribution * self.installments_per_year,
            });
            salary *= growth;
        }

        ContributionSchedule { years }
    }
}

impl Default for ContributionProjector {
    fn default() -> Self {
        Self::new(12)
    }
}
