//! Simulation request as received from the caller

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::assumptions::{AssumptionInput, BuiltinTable};
use crate::participant::{Participant, PlanType};

fn default_table_name() -> String {
    BuiltinTable::Iam2012Basic.name().to_string()
}

/// One participant, one plan, one set of assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub plan_type: PlanType,

    pub participant: Participant,

    pub assumptions: AssumptionInput,

    /// Defaults to the built-in IAM 2012 Basic table
    #[serde(default = "default_table_name")]
    pub mortality_table_name: String,

    /// Anchors the projection series to calendar years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation_date: Option<NaiveDate>,
}

impl SimulationRequest {
    /// Read a request from a JSON file
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Same request for a different participant
    pub fn for_participant(&self, participant: Participant) -> Self {
        Self {
            participant,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{BenefitTargetMode, ConversionMode};
    use crate::participant::Gender;

    #[test]
    fn test_parse_bd_request() {
        let json = r#"{
            "plan_type": "BD",
            "participant": {"age": 35, "gender": "male", "monthly_salary": 8000},
            "assumptions": {
                "discount_rate": 0.05,
                "salary_growth_rate": 0.0,
                "contribution_rate": 0.11,
                "retirement_age": 65,
                "benefit_target_mode": "FIXED_VALUE",
                "benefit_target_value": 6000
            },
            "mortality_table_name": "IAM_2012_BASIC",
            "valuation_date": "2026-01-01"
        }"#;

        let request: SimulationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.plan_type, PlanType::DefinedBenefit);
        assert_eq!(request.participant.gender, Gender::Male);
        assert_eq!(request.participant.initial_balance, 0.0);
        assert_eq!(request.assumptions.benefit_target_mode, Some(BenefitTargetMode::FixedValue));
        assert_eq!(request.valuation_date, NaiveDate::from_ymd_opt(2026, 1, 1));
    }

    #[test]
    fn test_parse_cd_request_with_defaults() {
        let json = r#"{
            "plan_type": "CD",
            "participant": {"age": 64, "gender": "F", "monthly_salary": 5000, "initial_balance": 500000},
            "assumptions": {
                "discount_rate": 0.04,
                "contribution_rate": 0.0,
                "retirement_age": 65,
                "cd_conversion_mode": "CERTAIN_10Y",
                "investment_return_rate": 0.04
            }
        }"#;

        let request: SimulationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.mortality_table_name, "IAM_2012_BASIC");
        assert_eq!(request.assumptions.salary_growth_rate, 0.0);
        assert_eq!(
            request.assumptions.cd_conversion_mode,
            Some(ConversionMode::TermCertain { years: 10 })
        );
        assert_eq!(request.valuation_date, None);
    }

    #[test]
    fn test_unknown_plan_type_rejected() {
        let json = r#"{"plan_type": "XX", "participant": {"age": 1, "gender": "male", "monthly_salary": 1},
                       "assumptions": {"discount_rate": 0, "contribution_rate": 0, "retirement_age": 2}}"#;
        assert!(serde_json::from_str::<SimulationRequest>(json).is_err());
    }
}
