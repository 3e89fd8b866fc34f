//! CD balance projector: accumulation followed by income conversion

use log::debug;

use super::balance::accumulate_balances;
use super::conversion::{convert, ConversionContext};
use super::types::CdResult;
use crate::assumptions::{AssumptionSet, MortalityTable, PlanAssumptions};
use crate::config::EngineConfig;
use crate::error::{EngineResult, ValidationErrors};
use crate::participant::Participant;
use crate::projection::{ContributionProjector, DiscountCurve, ProjectionPoint, ProjectionSeries};

/// Projector for defined-contribution plans
pub struct CdBalanceProjector<'a> {
    table: &'a MortalityTable,
    config: &'a EngineConfig,
}

impl<'a> CdBalanceProjector<'a> {
    pub fn new(table: &'a MortalityTable, config: &'a EngineConfig) -> Self {
        Self { table, config }
    }

    /// Project the balance to retirement and convert it into income
    pub fn project(&self, participant: &Participant, assumptions: &AssumptionSet) -> EngineResult<CdResult> {
        let (return_rate, mode) = match assumptions.plan() {
            PlanAssumptions::DefinedContribution {
                investment_return_rate,
                conversion_mode,
            } => (*investment_return_rate, *conversion_mode),
            PlanAssumptions::DefinedBenefit { .. } => {
                let mut errors = ValidationErrors::new();
                errors.push("plan_type", "CD projection needs CD assumptions");
                return Err(errors.into());
            }
        };

        let schedule = ContributionProjector::from_config(self.config).project(participant, assumptions);
        let balances = accumulate_balances(participant.initial_balance, return_rate, &schedule);
        let projected_balance = balances.last().copied().unwrap_or(participant.initial_balance);

        let ctx = ConversionContext {
            table: self.table,
            current_age: participant.age,
            retirement_age: assumptions.retirement_age(),
            discount: DiscountCurve::single_rate(assumptions.discount_rate()),
            investment_return_rate: return_rate,
            installments_per_year: self.config.installments(),
            epsilon: self.config.degenerate_annuity_epsilon,
        };
        let income = convert(projected_balance, mode, &ctx)?;

        let mut series = ProjectionSeries::with_capacity(schedule.len() + income.payouts.len());
        for year in schedule.years() {
            let survival = self.table.survival_probability(participant.age, year.year_offset)?;
            series.push(ProjectionPoint::accumulation(
                year,
                balances[year.year_offset as usize + 1],
                survival,
            ));
        }
        let offset = schedule.len() as u32;
        for (k, payout) in income.payouts.iter().enumerate() {
            series.push(ProjectionPoint::payout(
                offset + k as u32,
                payout.age,
                payout.payment,
                payout.fund_value,
                payout.survival_probability,
            ));
        }

        debug!(
            "CD projection: balance {:.2} at {}, {} income {:.2}/month",
            projected_balance,
            assumptions.retirement_age(),
            mode,
            income.monthly_income
        );

        Ok(CdResult {
            projected_balance,
            monthly_income: income.monthly_income,
            conversion_mode_used: mode,
            annuity_factor: income.annuity_factor,
            exhaustion_age: income.exhaustion_age,
            residual_balance: income.residual_balance,
            total_contributions: schedule.total_contributions(),
            projection_series: series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{AssumptionInput, ConversionMode, MortalityRegistry};
    use crate::config::ValidationLimits;
    use crate::participant::{Gender, PlanType};
    use approx::assert_relative_eq;
    use proptest::prelude::{prop_assert, proptest};
    use std::sync::Arc;

    fn iam(gender: Gender) -> Arc<MortalityTable> {
        MortalityRegistry::with_builtin_tables()
            .table("IAM_2012_BASIC", gender)
            .unwrap()
    }

    fn input(mode: ConversionMode) -> AssumptionInput {
        AssumptionInput {
            discount_rate: 0.04,
            salary_growth_rate: 0.0,
            contribution_rate: 0.0,
            retirement_age: 65,
            benefit_target_mode: None,
            benefit_target_value: None,
            cd_conversion_mode: Some(mode),
            investment_return_rate: Some(0.0),
        }
    }

    fn run(participant: &Participant, input: &AssumptionInput) -> CdResult {
        let table = iam(participant.gender);
        let config = EngineConfig::default();
        let set = AssumptionSet::validate(
            input,
            PlanType::DefinedContribution,
            participant,
            Some(&table),
            &ValidationLimits::default(),
            &mut ValidationErrors::new(),
        )
        .unwrap();
        CdBalanceProjector::new(&table, &config).project(participant, &set).unwrap()
    }

    #[test]
    fn test_life_annuity_scenario() {
        let participant = Participant::new(64, Gender::Male, 10_000.0, 500_000.0);
        let result = run(&participant, &input(ConversionMode::LifeAnnuity));

        assert_eq!(result.projected_balance, 500_000.0);
        assert!(result.monthly_income > 0.0);
        let factor = result.annuity_factor.unwrap();
        assert_relative_eq!(
            result.monthly_income * 12.0 * factor,
            result.projected_balance,
            max_relative = 1e-6
        );
        assert_eq!(result.conversion_mode_used, ConversionMode::LifeAnnuity);

        let series = &result.projection_series;
        assert!(series.is_contiguous());
        assert_eq!(series.accumulation().count(), 1);
        assert_eq!(series.last().unwrap().age, 120);
    }

    #[test]
    fn test_term_certain_scenario() {
        let participant = Participant::new(64, Gender::Male, 10_000.0, 500_000.0);
        let ten = run(&participant, &input(ConversionMode::TermCertain { years: 10 }));
        let twenty = run(&participant, &input(ConversionMode::TermCertain { years: 20 }));

        assert!(ten.monthly_income > twenty.monthly_income);
        assert_eq!(ten.projection_series.payout().count(), 10);
        assert_eq!(twenty.projection_series.payout().count(), 20);
    }

    #[test]
    fn test_contributions_accumulate() {
        let participant = Participant::new(55, Gender::Female, 6_000.0, 20_000.0);
        let cd = AssumptionInput {
            contribution_rate: 0.10,
            investment_return_rate: Some(0.05),
            ..input(ConversionMode::ProgrammedWithdrawal { annual_rate: 0.06 })
        };
        let result = run(&participant, &cd);

        assert_relative_eq!(result.total_contributions, 72_000.0, max_relative = 1e-12);
        assert!(result.projected_balance > 20_000.0 + 72_000.0);

        let last_accumulation = result.projection_series.accumulation().last().unwrap();
        assert_eq!(last_accumulation.age, 64);
        assert_eq!(last_accumulation.fund_value, result.projected_balance);
        assert!(result.residual_balance.is_some());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_accumulation_fund_never_decreases(
            age in 25u32..64,
            salary in 500.0f64..30_000.0,
            rate in 0.0f64..0.3,
            return_rate in 0.0f64..0.12,
            initial in 0.0f64..200_000.0,
        ) {
            let participant = Participant::new(age, Gender::Female, salary, initial);
            let cd = AssumptionInput {
                contribution_rate: rate,
                investment_return_rate: Some(return_rate),
                ..input(ConversionMode::LifeAnnuity)
            };
            let result = run(&participant, &cd);

            let funds: Vec<f64> = result.projection_series.accumulation().map(|p| p.fund_value).collect();
            prop_assert!(funds.first().map_or(true, |f| *f >= initial));
            for pair in funds.windows(2) {
                prop_assert!(pair[1] >= pair[0]);
            }
        }
    }
}
