//! Participant profile and plan family

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Gender of the participant, selects the mortality column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "M", alias = "MALE", alias = "Male")]
    Male,
    #[serde(alias = "F", alias = "FEMALE", alias = "Female")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Gender::Male),
            "f" | "female" => Ok(Gender::Female),
            other => Err(format!("Unknown gender: {}", other)),
        }
    }
}

/// Retirement plan family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanType {
    /// Defined Benefit
    #[serde(rename = "BD", alias = "DB", alias = "DEFINED_BENEFIT")]
    DefinedBenefit,
    /// Defined Contribution
    #[serde(rename = "CD", alias = "DC", alias = "DEFINED_CONTRIBUTION")]
    DefinedContribution,
}

impl PlanType {
    pub fn code(&self) -> &'static str {
        match self {
            PlanType::DefinedBenefit => "BD",
            PlanType::DefinedContribution => "CD",
        }
    }
}

/// A single plan participant, immutable for the duration of a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Current age in whole years
    pub age: u32,

    pub gender: Gender,

    /// Current monthly salary
    pub monthly_salary: f64,

    /// Balance already accumulated (CD account, or assets accrued to a BD participant)
    #[serde(default)]
    pub initial_balance: f64,
}

impl Participant {
    pub fn new(age: u32, gender: Gender, monthly_salary: f64, initial_balance: f64) -> Self {
        Self {
            age,
            gender,
            monthly_salary,
            initial_balance,
        }
    }

    /// Attained age after `years` projection years
    pub fn attained_age(&self, years: u32) -> u32 {
        self.age + years
    }

    /// Years remaining until `retirement_age` (0 when already there)
    pub fn years_to(&self, retirement_age: u32) -> u32 {
        retirement_age.saturating_sub(self.age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_wire_values() {
        let male: Gender = serde_json::from_str("\"male\"").unwrap();
        let female: Gender = serde_json::from_str("\"F\"").unwrap();
        assert_eq!(male, Gender::Male);
        assert_eq!(female, Gender::Female);
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
        assert_eq!("MALE".parse::<Gender>().unwrap(), Gender::Male);
        assert!("x".parse::<Gender>().is_err());
    }

    #[test]
    fn test_plan_type_codes() {
        let bd: PlanType = serde_json::from_str("\"BD\"").unwrap();
        let cd: PlanType = serde_json::from_str("\"DC\"").unwrap();
        assert_eq!(bd, PlanType::DefinedBenefit);
        assert_eq!(cd, PlanType::DefinedContribution);
        assert_eq!(serde_json::to_string(&cd).unwrap(), "\"CD\"");
    }

    #[test]
    fn test_participant_timing() {
        let participant = Participant::new(35, Gender::Male, 8_000.0, 0.0);
        assert_eq!(participant.attained_age(10), 45);
        assert_eq!(participant.years_to(65), 30);
        assert_eq!(participant.years_to(30), 0);

        let parsed: Participant =
            serde_json::from_str(r#"{"age": 40, "gender": "female", "monthly_salary": 5000}"#).unwrap();
        assert_eq!(parsed.initial_balance, 0.0);
    }
}
