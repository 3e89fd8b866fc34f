//! Simulation orchestrator: validation, dispatch and life-expectancy attachment
//!
//! Stateless apart from the shared mortality registry, so one orchestrator
//! can serve any number of concurrent requests. Identical requests always
//! produce identical results.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use log::debug;

use super::request::SimulationRequest;
use super::result::{PlanResult, SimulationResult};
use crate::accumulation::CdBalanceProjector;
use crate::assumptions::{
    AssumptionSet, MortalityPoint, MortalityRegistry, MortalityTable, NamedCsvTable, SurvivalPoint,
};
use crate::config::EngineConfig;
use crate::deadline::Deadline;
use crate::error::{EngineResult, MortalityError, ValidationErrors};
use crate::participant::{Gender, Participant, PlanType};
use crate::reserves::BdReserveCalculator;

/// A request that passed validation, with its mortality table resolved
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub participant: Participant,
    pub assumptions: AssumptionSet,
    pub table: Arc<MortalityTable>,
    pub valuation_date: Option<NaiveDate>,
}

/// Entry point of the engine
#[derive(Debug, Clone)]
pub struct SimulationOrchestrator {
    registry: Arc<MortalityRegistry>,
    config: EngineConfig,
}

impl SimulationOrchestrator {
    pub fn new(registry: Arc<MortalityRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Built-in tables and default configuration
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(MortalityRegistry::with_builtin_tables()), EngineConfig::default())
    }

    /// Built-in tables plus `csv_tables`, with the radix taken from `config`
    pub fn from_config(config: EngineConfig, csv_tables: &[NamedCsvTable]) -> Self {
        let registry = MortalityRegistry::builder()
            .radix(config.radix)
            .with_builtin_tables()
            .with_csv_tables(csv_tables)
            .build();
        Self::new(Arc::new(registry), config)
    }

    pub fn registry(&self) -> &MortalityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check the request against every data-model invariant
    ///
    /// All violations are collected before failing. Mortality failures other
    /// than an unknown table name are fatal and returned as-is.
    pub fn validate(&self, request: &SimulationRequest) -> EngineResult<ValidatedRequest> {
        let mut errors = ValidationErrors::new();
        let participant = &request.participant;

        errors.check(
            participant.monthly_salary.is_finite() && participant.monthly_salary > 0.0,
            "participant.monthly_salary",
            || format!("must be positive, got {}", participant.monthly_salary),
        );
        errors.check(
            participant.initial_balance.is_finite() && participant.initial_balance >= 0.0,
            "participant.initial_balance",
            || format!("must be non-negative, got {}", participant.initial_balance),
        );

        let table = match self
            .registry
            .table(&request.mortality_table_name, participant.gender)
        {
            Ok(table) => Some(table),
            Err(MortalityError::UnknownTable { name }) => {
                errors.push(
                    "mortality_table_name",
                    format!(
                        "unknown table {}, available: {}",
                        name,
                        self.registry.table_names().join(", ")
                    ),
                );
                None
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(table) = &table {
            errors.check(table.contains_age(participant.age), "participant.age", || {
                format!(
                    "must be within table {} ({}..={}), got {}",
                    table.name(),
                    table.min_age(),
                    table.terminal_age(),
                    participant.age
                )
            });
        }

        let assumptions = AssumptionSet::validate(
            &request.assumptions,
            request.plan_type,
            participant,
            table.as_deref(),
            &self.config.limits,
            &mut errors,
        );

        match (assumptions, table) {
            (Some(assumptions), Some(table)) if errors.is_empty() => Ok(ValidatedRequest {
                participant: participant.clone(),
                assumptions,
                table,
                valuation_date: request.valuation_date,
            }),
            _ => Err(errors.into()),
        }
    }

    /// Run one simulation without a deadline
    pub fn simulate(&self, request: &SimulationRequest) -> EngineResult<SimulationResult> {
        self.simulate_with_deadline(request, &Deadline::none())
    }

    /// Run one simulation, giving up once `deadline` passes
    pub fn simulate_with_deadline(
        &self,
        request: &SimulationRequest,
        deadline: &Deadline,
    ) -> EngineResult<SimulationResult> {
        deadline.check()?;
        let validated = self.validate(request)?;
        self.run_validated(&validated, deadline)
    }

    /// Dispatch an already validated request by plan type
    pub fn run_validated(&self, request: &ValidatedRequest, deadline: &Deadline) -> EngineResult<SimulationResult> {
        let participant = &request.participant;
        let assumptions = &request.assumptions;
        let table = request.table.as_ref();

        debug!(
            "Simulating {} plan: age {}, retirement {}, table {} ({})",
            assumptions.plan_type().code(),
            participant.age,
            assumptions.retirement_age(),
            table.name(),
            participant.gender
        );

        let plan = match assumptions.plan_type() {
            PlanType::DefinedBenefit => PlanResult::DefinedBenefit(
                BdReserveCalculator::new(table, &self.config).calculate(participant, assumptions, deadline)?,
            ),
            PlanType::DefinedContribution => PlanResult::DefinedContribution(
                CdBalanceProjector::new(table, &self.config).project(participant, assumptions)?,
            ),
        };

        let mut result = SimulationResult {
            plan,
            mortality_table: table.name().to_string(),
            life_expectancy: table.life_expectancy(participant.age)?,
            life_expectancy_at_retirement: table.life_expectancy(assumptions.retirement_age())?,
            valuation_date: request.valuation_date,
        };

        if let Some(date) = request.valuation_date {
            result
                .plan
                .projection_series_mut()
                .assign_calendar_years(date.year());
        }

        Ok(result)
    }

    /// Mortality query for chart collaborators: qx ordered by age
    pub fn mortality_rates(&self, table_name: &str, gender: Gender) -> EngineResult<Vec<MortalityPoint>> {
        Ok(self.registry.rates(table_name, gender)?)
    }

    /// qx and lx ordered by age
    pub fn survival_curve(&self, table_name: &str, gender: Gender) -> EngineResult<Vec<SurvivalPoint>> {
        Ok(self.registry.survival_curve(table_name, gender)?)
    }
}

impl Default for SimulationOrchestrator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{AssumptionInput, BenefitTargetMode, ConversionMode};
    use crate::error::EngineError;
    use crate::reserves::SufficiencyStatus;
    use approx::assert_relative_eq;
    use std::time::Instant;

    fn bd_request() -> SimulationRequest {
        SimulationRequest {
            plan_type: PlanType::DefinedBenefit,
            participant: Participant::new(35, Gender::Male, 8_000.0, 0.0),
            assumptions: AssumptionInput {
                discount_rate: 0.05,
                salary_growth_rate: 0.0,
                contribution_rate: 0.11,
                retirement_age: 65,
                benefit_target_mode: Some(BenefitTargetMode::FixedValue),
                benefit_target_value: Some(6_000.0),
                cd_conversion_mode: None,
                investment_return_rate: None,
            },
            mortality_table_name: "IAM_2012_BASIC".to_string(),
            valuation_date: None,
        }
    }

    fn cd_request(mode: ConversionMode) -> SimulationRequest {
        SimulationRequest {
            plan_type: PlanType::DefinedContribution,
            participant: Participant::new(64, Gender::Female, 5_000.0, 500_000.0),
            assumptions: AssumptionInput {
                discount_rate: 0.04,
                salary_growth_rate: 0.0,
                contribution_rate: 0.0,
                retirement_age: 65,
                benefit_target_mode: None,
                benefit_target_value: None,
                cd_conversion_mode: Some(mode),
                investment_return_rate: Some(0.0),
            },
            mortality_table_name: "IAM_2012_BASIC".to_string(),
            valuation_date: None,
        }
    }

    #[test]
    fn test_bd_scenario() {
        let orchestrator = SimulationOrchestrator::with_defaults();
        let result = orchestrator.simulate(&bd_request()).unwrap();

        assert_eq!(result.plan_type(), PlanType::DefinedBenefit);
        let bd = result.as_bd().unwrap();
        assert!(bd.rmba > 0.0);
        assert_eq!(bd.sufficiency_status, SufficiencyStatus::Deficit);
        assert!(result.life_expectancy > result.life_expectancy_at_retirement);
        assert_eq!(result.mortality_table, "IAM_2012_BASIC");
    }

    #[test]
    fn test_cd_life_annuity_scenario() {
        let orchestrator = SimulationOrchestrator::with_defaults();
        let result = orchestrator.simulate(&cd_request(ConversionMode::LifeAnnuity)).unwrap();

        let cd = result.as_cd().unwrap();
        assert!(cd.monthly_income > 0.0);
        assert_relative_eq!(
            cd.monthly_income * 12.0 * cd.annuity_factor.unwrap(),
            cd.projected_balance,
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_cd_term_certain_ordering() {
        let orchestrator = SimulationOrchestrator::with_defaults();
        let ten = orchestrator
            .simulate(&cd_request(ConversionMode::TermCertain { years: 10 }))
            .unwrap();
        let twenty = orchestrator
            .simulate(&cd_request(ConversionMode::TermCertain { years: 20 }))
            .unwrap();

        assert!(ten.as_cd().unwrap().monthly_income > twenty.as_cd().unwrap().monthly_income);
    }

    #[test]
    fn test_idempotent() {
        let orchestrator = SimulationOrchestrator::with_defaults();
        for request in [bd_request(), cd_request(ConversionMode::ProgrammedWithdrawal { annual_rate: 0.07 })] {
            let first = orchestrator.simulate(&request).unwrap();
            let second = orchestrator.simulate(&request).unwrap();

            assert_eq!(first, second);
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }

    #[test]
    fn test_all_violations_reported() {
        let mut request = bd_request();
        request.participant.monthly_salary = -1.0;
        request.participant.initial_balance = -5.0;
        request.assumptions.discount_rate = 0.9;
        request.assumptions.retirement_age = 30;

        let err = SimulationOrchestrator::with_defaults().validate(&request).unwrap_err();
        match err {
            EngineError::Validation(errors) => {
                assert_eq!(errors.len(), 4);
                assert!(errors.has_field("participant.monthly_salary"));
                assert!(errors.has_field("participant.initial_balance"));
                assert!(errors.has_field("assumptions.discount_rate"));
                assert!(errors.has_field("assumptions.retirement_age"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_table_is_a_violation() {
        let mut request = bd_request();
        request.mortality_table_name = "GAM_94".to_string();
        request.assumptions.contribution_rate = -0.1;

        match SimulationOrchestrator::with_defaults().simulate(&request) {
            Err(EngineError::Validation(errors)) => {
                assert!(errors.has_field("mortality_table_name"));
                assert!(errors.has_field("assumptions.contribution_rate"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_terminal_age_boundary() {
        let registry = MortalityRegistry::builder()
            .with_rates("SHORT", 60, vec![0.05; 51], vec![0.05; 51]) // 60..=110
            .build();
        let orchestrator = SimulationOrchestrator::new(Arc::new(registry), EngineConfig::default());

        let mut request = cd_request(ConversionMode::LifeAnnuity);
        request.mortality_table_name = "SHORT".to_string();
        request.participant.age = 109;
        request.assumptions.retirement_age = 110;
        assert!(orchestrator.simulate(&request).is_ok());

        request.participant.age = 110;
        request.assumptions.retirement_age = 111;
        let err = orchestrator.simulate(&request).unwrap_err();
        assert!(matches!(err, EngineError::Validation(ref e) if e.has_field("assumptions.retirement_age")));

        request.participant.age = 111;
        request.assumptions.retirement_age = 112;
        let err = orchestrator.simulate(&request).unwrap_err();
        assert!(matches!(err, EngineError::Validation(ref e) if e.has_field("participant.age")));

        let table = orchestrator.registry().table("SHORT", Gender::Female).unwrap();
        assert!(table.life_expectancy(110).is_ok());
        assert!(matches!(table.qx(111), Err(MortalityError::OutOfDomain { .. })));
    }

    #[test]
    fn test_calendar_years_from_valuation_date() {
        let mut request = bd_request();
        request.valuation_date = NaiveDate::from_ymd_opt(2026, 3, 31);

        let result = SimulationOrchestrator::with_defaults().simulate(&request).unwrap();
        let series = result.projection_series();
        assert_eq!(series.first().unwrap().calendar_year, Some(2026));
        assert_eq!(series.points()[30].calendar_year, Some(2056));
        assert_eq!(series.points()[30].age, 65);
    }

    #[test]
    fn test_expired_deadline() {
        let err = SimulationOrchestrator::with_defaults()
            .simulate_with_deadline(&bd_request(), &Deadline::at(Instant::now()))
            .unwrap_err();
        assert_eq!(err, EngineError::DeadlineExceeded);
    }

    #[test]
    fn test_mortality_query_ordered() {
        let orchestrator = SimulationOrchestrator::with_defaults();
        let rates = orchestrator.mortality_rates("IAM_2012_BASIC", Gender::Female).unwrap();

        assert_eq!(rates.len(), 121);
        assert!(rates.windows(2).all(|w| w[1].age == w[0].age + 1));
        assert!(orchestrator.mortality_rates("NOPE", Gender::Female).is_err());

        let curve = orchestrator.survival_curve("IAM_2012_BASIC", Gender::Female).unwrap();
        assert!(curve.windows(2).all(|w| w[1].lx <= w[0].lx));
    }

    #[test]
    fn test_from_config_applies_radix_and_extra_tables() {
        let config = EngineConfig {
            radix: 1_000.0,
            ..EngineConfig::default()
        };
        let extra = vec!["LOCAL=/nonexistent/local.csv".parse::<NamedCsvTable>().unwrap()];
        let orchestrator = SimulationOrchestrator::from_config(config, &extra);

        assert_eq!(orchestrator.config().radix, 1_000.0);
        assert!(orchestrator.registry().contains("local"));

        let curve = orchestrator.survival_curve("IAM_2012_BASIC", Gender::Male).unwrap();
        assert_relative_eq!(curve[0].lx, 1_000.0);
    }
}
