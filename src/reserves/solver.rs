//! Bracketing root search for monotone funding functions
//!
//! The sufficiency of a BD plan is increasing in the contribution rate, so a
//! plain bisection on a sign-changing bracket always converges. Every step
//! checks the caller's deadline first and the step count is capped.

use log::debug;

use crate::deadline::Deadline;
use crate::error::EngineResult;

/// Result of a bisection run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveOutcome {
    /// |f(root)| is within tolerance
    Converged { root: f64, iterations: u32 },
    /// Iteration cap reached; `best` is the upper end of the final bracket
    Exhausted { best: f64, iterations: u32 },
}

impl SolveOutcome {
    pub fn root(&self) -> f64 {
        match *self {
            SolveOutcome::Converged { root, .. } => root,
            SolveOutcome::Exhausted { best, .. } => best,
        }
    }

    pub fn iterations(&self) -> u32 {
        match *self {
            SolveOutcome::Converged { iterations, .. } | SolveOutcome::Exhausted { iterations, .. } => iterations,
        }
    }

    pub fn converged(&self) -> bool {
        matches!(self, SolveOutcome::Converged { .. })
    }
}

/// Bisection for an increasing function with f(lo) < -tolerance and f(hi) > tolerance
///
/// The upper end of the bracket keeps f > 0, so an exhausted search still
/// returns a point on the funded side of the root.
pub fn bisect_increasing<F>(
    mut f: F,
    mut lo: f64,
    mut hi: f64,
    tolerance: f64,
    max_iterations: u32,
    deadline: &Deadline,
) -> EngineResult<SolveOutcome>
where
    F: FnMut(f64) -> f64,
{
    for iteration in 1..=max_iterations {
        deadline.check()?;

        let mid = 0.5 * (lo + hi);
        let value = f(mid);
        debug!("bisection step {}: x = {:.10}, f(x) = {:.6}", iteration, mid, value);

        if value.abs() <= tolerance {
            return Ok(SolveOutcome::Converged {
                root: mid,
                iterations: iteration,
            });
        }

        if value < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Ok(SolveOutcome::Exhausted {
        best: hi,
        iterations: max_iterations,
    })
}
