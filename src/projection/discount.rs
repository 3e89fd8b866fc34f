//! Discounting and annuity factors on an annual time step
//!
//! Supports:
//! - Discount factors v^t for a single valuation rate
//! - Certain annuity-due factors (no mortality)
//! - Life annuity-due factors weighted by a mortality table

use serde::{Deserialize, Serialize};

use crate::assumptions::MortalityTable;
use crate::error::MortalityError;

/// Single-rate discount curve with annual compounding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountCurve {
    /// Annual effective discount rate
    pub annual_rate: f64,
}

impl DiscountCurve {
    pub fn single_rate(annual_rate: f64) -> Self {
        Self { annual_rate }
    }

    /// One-year discount factor v = 1 / (1 + i)
    pub fn v(&self) -> f64 {
        1.0 / (1.0 + self.annual_rate)
    }

    /// Discount factor to `years` from now
    pub fn discount_factor(&self, years: u32) -> f64 {
        self.v().powi(years as i32)
    }

    /// Discount factors for years 0..n, built by repeated multiplication
    pub fn factors(&self, n: usize) -> Vec<f64> {
        let v = self.v();
        let mut factors = Vec::with_capacity(n);
        let mut current = 1.0;
        for _ in 0..n {
            factors.push(current);
            current *= v;
        }
        factors
    }

    /// Present value of a stream of annual amounts, amount k paid at time k
    pub fn pv_stream(&self, amounts: &[f64]) -> f64 {
        amounts
            .iter()
            .zip(self.factors(amounts.len()))
            .map(|(amount, v)| amount * v)
            .sum()
    }

    /// Certain annuity-due factor: n payments of 1, the first immediate
    ///
    /// (1 - v^n) / (1 - v), or n when the rate is zero
    pub fn certain_annuity_due(&self, years: u32) -> f64 {
        if self.annual_rate.abs() < 1e-12 {
            return years as f64;
        }
        (1.0 - self.discount_factor(years)) / (1.0 - self.v())
    }

    /// Life annuity-due factors for every age from `age` to the table end
    ///
    /// Element k is the factor at age `age + k`, built backwards from the
    /// terminal age with ä(y) = 1 + v * p(y) * ä(y+1) and ä(terminal) = 1.
    pub fn life_annuity_path(
        &self,
        table: &MortalityTable,
        age: u32,
    ) -> Result<Vec<f64>, MortalityError> {
        let terminal = table.terminal_age();
        if !table.contains_age(age) {
            // Surface the table's own domain error
            table.qx(age)?;
        }

        let v = self.v();
        let len = (terminal - age + 1) as usize;
        let mut factors = vec![0.0; len];
        let mut next = 0.0;
        for idx in (0..len).rev() {
            let y = age + idx as u32;
            let p = 1.0 - table.qx(y)?;
            let factor = 1.0 + v * p * next;
            factors[idx] = factor;
            next = factor;
        }
        Ok(factors)
    }

    /// Life annuity-due factor at `age`: sum over k of v^k * kpx to the table end
    pub fn life_annuity_due(&self, table: &MortalityTable, age: u32) -> Result<f64, MortalityError> {
        Ok(self.life_annuity_path(table, age)?[0])
    }
}

impl Default for DiscountCurve {
    fn default() -> Self {
        Self::single_rate(0.05)
    }
}
