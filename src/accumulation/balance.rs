//! CD balance accumulation
//!
//! `balance[t+1] = balance[t] * (1 + r) + contribution[t]`, seeded with the
//! participant's initial balance.

use crate::projection::ContributionSchedule;

/// Balances at the start of every accumulation year plus the retirement balance
///
/// Element t is the balance at age x+t; the last element is the balance at
/// retirement.
pub fn accumulate_balances(initial_balance: f64, return_rate: f64, schedule: &ContributionSchedule) -> Vec<f64> {
    let growth = 1.0 + return_rate;
    let mut balances = Vec::with_capacity(schedule.len() + 1);
    let mut balance = initial_balance;
    balances.push(balance);
    for year in schedule.years() {
        balance = balance * growth + year.annual_contribution;
        balances.push(balance);
    }
    balances
}
