//! Actuarial assumptions: mortality tables and plan assumptions

mod mortality;
mod plan;
mod registry;
mod tables;
pub mod loader;

pub use loader::{load_mortality_csv, load_mortality_from_reader, LoadedRates};
pub use mortality::{MortalityPoint, MortalityTable, SurvivalPoint};
pub use plan::{BenefitTarget, BenefitTargetMode, ConversionMode};
pub use registry::{MortalityRegistry, MortalityRegistryBuilder, NamedCsvTable, TableSource};
pub use tables::BuiltinTable;

use serde::{Deserialize, Serialize};

use crate::config::ValidationLimits;
use crate::error::ValidationErrors;
use crate::participant::{Participant, PlanType};

/// Plan assumptions as received from the caller, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionInput {
    pub discount_rate: f64,

    #[serde(default)]
    pub salary_growth_rate: f64,

    pub contribution_rate: f64,

    pub retirement_age: u32,

    /// Required for BD plans
    #[serde(default)]
    pub benefit_target_mode: Option<BenefitTargetMode>,

    #[serde(default)]
    pub benefit_target_value: Option<f64>,

    /// Required for CD plans
    #[serde(default)]
    pub cd_conversion_mode: Option<ConversionMode>,

    /// Required for CD plans
    #[serde(default)]
    pub investment_return_rate: Option<f64>,
}

/// Assumptions that only apply to one plan family
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "plan_type")]
pub enum PlanAssumptions {
    #[serde(rename = "BD")]
    DefinedBenefit { benefit_target: BenefitTarget },
    #[serde(rename = "CD")]
    DefinedContribution {
        investment_return_rate: f64,
        conversion_mode: ConversionMode,
    },
}

/// Validated, immutable bundle of plan assumptions
///
/// Only obtainable through [`AssumptionSet::validate`], so every instance
/// satisfies the data-model invariants for the participant it was checked
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AssumptionSet {
    discount_rate: f64,
    salary_growth_rate: f64,
    contribution_rate: f64,
    retirement_age: u32,
    plan: PlanAssumptions,
}

fn is_rate(value: f64) -> bool {
    value.is_finite()
}

impl AssumptionSet {
    /// Check `input` against the participant, table domain and limits.
    ///
    /// Violations are appended to `errors`; `None` is returned when any were
    /// found. `table` is `None` when the mortality table could not be
    /// resolved, in which case domain checks are skipped.
    pub fn validate(
        input: &AssumptionInput,
        plan_type: PlanType,
        participant: &Participant,
        table: Option<&MortalityTable>,
        limits: &ValidationLimits,
        errors: &mut ValidationErrors,
    ) -> Option<Self> {
        let before = errors.len();

        errors.check(
            is_rate(input.discount_rate)
                && input.discount_rate >= 0.0
                && input.discount_rate <= limits.max_discount_rate,
            "assumptions.discount_rate",
            || format!("must be in [0, {}], got {}", limits.max_discount_rate, input.discount_rate),
        );

        errors.check(
            is_rate(input.salary_growth_rate)
                && input.salary_growth_rate >= limits.min_growth_rate
                && input.salary_growth_rate <= limits.max_growth_rate,
            "assumptions.salary_growth_rate",
            || {
                format!(
                    "must be in [{}, {}], got {}",
                    limits.min_growth_rate, limits.max_growth_rate, input.salary_growth_rate
                )
            },
        );

        errors.check(
            is_rate(input.contribution_rate)
                && input.contribution_rate >= 0.0
                && input.contribution_rate <= limits.max_contribution_rate,
            "assumptions.contribution_rate",
            || {
                format!(
                    "must be in [0, {}], got {}",
                    limits.max_contribution_rate, input.contribution_rate
                )
            },
        );

        errors.check(
            input.retirement_age > participant.age,
            "assumptions.retirement_age",
            || {
                format!(
                    "must be greater than the participant's age {}, got {}",
                    participant.age, input.retirement_age
                )
            },
        );

        if let Some(table) = table {
            errors.check(
                table.contains_age(input.retirement_age),
                "assumptions.retirement_age",
                || {
                    format!(
                        "must be within table {} ({}..={}), got {}",
                        table.name(),
                        table.min_age(),
                        table.terminal_age(),
                        input.retirement_age
                    )
                },
            );
        }

        let plan = match plan_type {
            PlanType::DefinedBenefit => Self::validate_defined_benefit(input, limits, errors),
            PlanType::DefinedContribution => Self::validate_defined_contribution(input, limits, errors),
        };

        if errors.len() > before {
            return None;
        }

        plan.map(|plan| Self {
            discount_rate: input.discount_rate,
            salary_growth_rate: input.salary_growth_rate,
            contribution_rate: input.contribution_rate,
            retirement_age: input.retirement_age,
            plan,
        })
    }

    fn validate_defined_benefit(
        input: &AssumptionInput,
        limits: &ValidationLimits,
        errors: &mut ValidationErrors,
    ) -> Option<PlanAssumptions> {
        let mode = input.benefit_target_mode;
        let value = input.benefit_target_value;

        if mode.is_none() {
            errors.push("assumptions.benefit_target_mode", "required for BD plans");
        }
        let Some(value) = value else {
            errors.push("assumptions.benefit_target_value", "required for BD plans");
            return None;
        };

        match mode? {
            BenefitTargetMode::FixedValue => errors.check(
                value.is_finite() && value >= 0.0,
                "assumptions.benefit_target_value",
                || format!("fixed benefit must be non-negative, got {}", value),
            ),
            BenefitTargetMode::ReplacementRate => errors.check(
                value.is_finite() && value >= 0.0 && value <= limits.max_replacement_rate,
                "assumptions.benefit_target_value",
                || {
                    format!(
                        "replacement rate must be in [0, {}], got {}",
                        limits.max_replacement_rate, value
                    )
                },
            ),
        }

        Some(PlanAssumptions::DefinedBenefit {
            benefit_target: BenefitTarget::new(mode?, value),
        })
    }

    fn validate_defined_contribution(
        input: &AssumptionInput,
        limits: &ValidationLimits,
        errors: &mut ValidationErrors,
    ) -> Option<PlanAssumptions> {
        let return_rate = match input.investment_return_rate {
            Some(rate) => {
                errors.check(
                    is_rate(rate) && rate >= limits.min_growth_rate && rate <= limits.max_growth_rate,
                    "assumptions.investment_return_rate",
                    || {
                        format!(
                            "must be in [{}, {}], got {}",
                            limits.min_growth_rate, limits.max_growth_rate, rate
                        )
                    },
                );
                Some(rate)
            }
            None => {
                errors.push("assumptions.investment_return_rate", "required for CD plans");
                None
            }
        };

        let mode = match input.cd_conversion_mode {
            Some(mode) => {
                match mode {
                    ConversionMode::LifeAnnuity => {}
                    ConversionMode::TermCertain { years } => errors.check(
                        years >= 1 && years <= limits.max_term_years,
                        "assumptions.cd_conversion_mode",
                        || {
                            format!(
                                "term certain must run 1 to {} years, got {}",
                                limits.max_term_years, years
                            )
                        },
                    ),
                    ConversionMode::ProgrammedWithdrawal { annual_rate } => errors.check(
                        annual_rate.is_finite() && annual_rate > 0.0 && annual_rate <= 1.0,
                        "assumptions.cd_conversion_mode",
                        || format!("withdrawal rate must be in (0, 1], got {}", annual_rate),
                    ),
                }
                Some(mode)
            }
            None => {
                errors.push("assumptions.cd_conversion_mode", "required for CD plans");
                None
            }
        };

        Some(PlanAssumptions::DefinedContribution {
            investment_return_rate: return_rate?,
            conversion_mode: mode?,
        })
    }

    pub fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    pub fn salary_growth_rate(&self) -> f64 {
        self.salary_growth_rate
    }

    pub fn contribution_rate(&self) -> f64 {
        self.contribution_rate
    }

    pub fn retirement_age(&self) -> u32 {
        self.retirement_age
    }

    pub fn plan(&self) -> &PlanAssumptions {
        &self.plan
    }

    pub fn plan_type(&self) -> PlanType {
        match self.plan {
            PlanAssumptions::DefinedBenefit { .. } => PlanType::DefinedBenefit,
            PlanAssumptions::DefinedContribution { .. } => PlanType::DefinedContribution,
        }
    }

    /// Copy with a different contribution rate, used by the equilibrium search
    pub(crate) fn with_contribution_rate(&self, contribution_rate: f64) -> Self {
        Self {
            contribution_rate,
            ..*self
        }
    }
}
