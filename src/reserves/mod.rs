//! Defined-benefit reserve valuation
//!
//! The calculation follows a separation of concerns pattern:
//! 1. **Valuation**: mortality-weighted, discounted PV of contributions and benefits
//! 2. **Classification**: sufficiency against an equilibrium band
//! 3. **Suggestion**: bounded bisection over the contribution rate, plus a
//!    closed-form benefit value that equilibrates the plan
//!
//! # Example
//!
//! ```rust,ignore
//! use pension_sim::reserves::BdReserveCalculator;
//!
//! let calculator = BdReserveCalculator::new(&table, &config);
//! let result = calculator.calculate(&participant, &assumptions, &Deadline::none())?;
//! println!("RMBA: {:.2} ({})", result.rmba, result.sufficiency_status);
//! ```

mod calculator;
mod solver;
mod types;
mod valuation;

pub use calculator::BdReserveCalculator;
pub use solver::{bisect_increasing, SolveOutcome};
pub use types::{BdResult, SufficiencyStatus};
pub use valuation::BdValuation;
