//! Engine configuration
//!
//! All numeric knobs of the engine live here so a deployment can tune them
//! from a JSON file without touching the calculators. Missing fields fall back
//! to the defaults below.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Conventional survivor cohort size for l(x)
pub const DEFAULT_RADIX: f64 = 100_000.0;

/// Bounds applied to request inputs during validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Highest accepted annual discount rate
    pub max_discount_rate: f64,
    /// Lowest accepted salary growth (must stay above -1 so salary stays positive)
    pub min_growth_rate: f64,
    pub max_growth_rate: f64,
    /// Highest accepted contribution rate on input
    pub max_contribution_rate: f64,
    pub max_replacement_rate: f64,
    /// Longest accepted term-certain payout
    pub max_term_years: u32,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_discount_rate: 0.30,
            min_growth_rate: -0.99,
            max_growth_rate: 1.0,
            max_contribution_rate: 1.0,
            max_replacement_rate: 1.0,
            max_term_years: 100,
        }
    }
}

/// Configuration shared by every calculator in the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Survivor cohort at the first age of every table
    pub radix: f64,

    /// Salaries and benefit payments per year
    pub installments_per_year: u32,

    /// Equilibrium band as a fraction of PV(benefits)
    pub equilibrium_tolerance: f64,

    /// Absolute floor of the equilibrium band (currency units)
    pub equilibrium_floor: f64,

    /// Upper end of the contribution-rate search bracket
    pub max_contribution_rate: f64,

    /// Hard ceiling on bisection steps
    pub solver_max_iterations: u32,

    /// Hard ceiling on the size of a sensitivity grid
    pub max_sensitivity_combinations: usize,

    /// Annuity factors at or below this are treated as zero
    pub degenerate_annuity_epsilon: f64,

    /// Evaluate sensitivity combinations on the rayon pool
    pub parallel_sensitivity: bool,

    pub limits: ValidationLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            radix: DEFAULT_RADIX,
            installments_per_year: 12,
            equilibrium_tolerance: 0.005,
            equilibrium_floor: 0.01,
            max_contribution_rate: 0.30,
            solver_max_iterations: 50,
            max_sensitivity_combinations: 1_000,
            degenerate_annuity_epsilon: 1e-9,
            parallel_sensitivity: true,
            limits: ValidationLimits::default(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file and validate it
    pub fn from_json_path(path: &Path) -> EngineResult<Self> {
        let file = File::open(path).map_err(|e| EngineError::Config {
            reason: format!("cannot open {}: {}", path.display(), e),
        })?;
        let config: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| EngineError::Config {
                reason: format!("cannot parse {}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Serial configuration, useful when the caller already parallelises
    pub fn serial() -> Self {
        Self {
            parallel_sensitivity: false,
            ..Self::default()
        }
    }

    /// Reject configurations the calculators cannot work with
    pub fn validate(&self) -> EngineResult<()> {
        let fail = |reason: &str| {
            Err(EngineError::Config {
                reason: reason.to_string(),
            })
        };

        if !(self.radix.is_finite() && self.radix > 0.0) {
            return fail("radix must be a positive number");
        }
        if self.installments_per_year == 0 {
            return fail("installments_per_year must be at least 1");
        }
        if !(self.equilibrium_tolerance >= 0.0 && self.equilibrium_floor >= 0.0) {
            return fail("equilibrium tolerance and floor must be non-negative");
        }
        if !(self.max_contribution_rate > 0.0 && self.max_contribution_rate <= 1.0) {
            return fail("max_contribution_rate must be in (0, 1]");
        }
        if self.solver_max_iterations == 0 {
            return fail("solver_max_iterations must be at least 1");
        }
        if self.max_sensitivity_combinations == 0 {
            return fail("max_sensitivity_combinations must be at least 1");
        }
        if self.limits.min_growth_rate <= -1.0 {
            return fail("limits.min_growth_rate must be above -1");
        }
        Ok(())
    }

    /// Installments per year as a float multiplier
    pub fn installments(&self) -> f64 {
        self.installments_per_year as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.solver_max_iterations, 50);
        assert_eq!(config.installments(), 12.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"installments_per_year": 13, "limits": {"max_discount_rate": 0.2}}"#)
                .unwrap();

        assert_eq!(config.installments_per_year, 13);
        assert_eq!(config.limits.max_discount_rate, 0.2);
        assert_eq!(config.limits.max_contribution_rate, 1.0);
        assert_eq!(config.radix, DEFAULT_RADIX);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            installments_per_year: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::Config { .. })));

        let config = EngineConfig {
            max_contribution_rate: 1.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
