//! Error taxonomy for the simulation engine
//!
//! Every error is local to a single simulation request. Mortality failures are
//! fatal to the request that hit them, validation failures carry the full list
//! of violated constraints so the caller can fix everything in one pass.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the engine
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures while loading or querying a mortality table
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MortalityError {
    #[error("unknown mortality table: {name}")]
    UnknownTable { name: String },

    #[error("age {age} is outside the domain of table {table} ({min_age}..={max_age})")]
    OutOfDomain {
        table: String,
        age: u32,
        min_age: u32,
        max_age: u32,
    },

    #[error("invalid mortality table {table}: {reason}")]
    InvalidTable { table: String, reason: String },

    #[error("failed to load mortality table {table}: {reason}")]
    Load { table: String, reason: String },
}

/// A single violated input constraint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Dotted path of the offending field, e.g. `assumptions.discount_rate`
    pub field: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every constraint a request violated, in the order they were checked
#[derive(Debug, Clone, Default, PartialEq, Serialize, Error)]
#[error("invalid simulation input ({} violation(s)): {}", .violations.len(), join_violations(.violations))]
pub struct ValidationErrors {
    pub violations: Vec<Violation>,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation against `field`
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record a violation when `condition` does not hold
    pub fn check(&mut self, condition: bool, field: &str, message: impl FnOnce() -> String) {
        if !condition {
            self.push(field, message());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Whether any violation was recorded against `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected violations
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Top-level engine error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Mortality(#[from] MortalityError),

    #[error("degenerate annuity factor {factor:e} for {mode} conversion")]
    DegenerateAnnuity { mode: String, factor: f64 },

    #[error("deadline exceeded before the calculation completed")]
    DeadlineExceeded,

    #[error("sensitivity grid has {requested} combinations, limit is {limit}")]
    TooManyCombinations { requested: usize, limit: usize },

    #[error("invalid sensitivity axis {parameter}: {reason}")]
    InvalidAxis { parameter: String, reason: String },

    #[error("invalid engine configuration: {reason}")]
    Config { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_list_every_violation() {
        let mut errors = ValidationErrors::new();
        errors.push("participant.age", "must be at least 0");
        errors.check(false, "assumptions.discount_rate", || "must be below 0.30".to_string());
        errors.check(true, "assumptions.contribution_rate", || unreachable!());

        assert_eq!(errors.len(), 2);
        assert!(errors.has_field("assumptions.discount_rate"));

        let message = errors.to_string();
        assert!(message.contains("2 violation(s)"));
        assert!(message.contains("participant.age"));
        assert!(message.contains("assumptions.discount_rate"));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(5), Ok(5));

        let mut errors = ValidationErrors::new();
        errors.push("x", "bad");
        assert!(errors.into_result(5).is_err());
    }

    #[test]
    fn test_engine_error_from_mortality() {
        let err: EngineError = MortalityError::UnknownTable { name: "XYZ".into() }.into();
        assert_eq!(err.to_string(), "unknown mortality table: XYZ");
    }
}
