//! Conversion of a retirement balance into income
//!
//! One dispatch function per conversion mode:
//! - Life annuity: balance / ä(R), mortality-weighted to the table end
//! - Term certain: balance / ä(N), no mortality
//! - Programmed withdrawal: a fixed share of the remaining balance each year
//!   until the life-expectancy horizon or exhaustion

use crate::assumptions::{ConversionMode, MortalityTable};
use crate::error::{EngineError, EngineResult};
use crate::projection::DiscountCurve;

/// Everything a conversion needs besides the balance
#[derive(Debug, Clone, Copy)]
pub struct ConversionContext<'a> {
    pub table: &'a MortalityTable,
    /// Age at which the participant is valued
    pub current_age: u32,
    pub retirement_age: u32,
    pub discount: DiscountCurve,
    pub investment_return_rate: f64,
    pub installments_per_year: f64,
    /// Annuity factors at or below this are degenerate
    pub epsilon: f64,
}

/// One payout year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoutYear {
    pub age: u32,
    /// Annual income paid in the year
    pub payment: f64,
    /// Remaining fund (or reserve of the remaining annuity) for the year
    pub fund_value: f64,
    /// Survival from the current age to the start of the year
    pub survival_probability: f64,
}

/// Income produced by a conversion
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeConversion {
    pub monthly_income: f64,
    pub annuity_factor: Option<f64>,
    pub exhaustion_age: Option<u32>,
    pub residual_balance: Option<f64>,
    pub payouts: Vec<PayoutYear>,
}

/// Convert `balance` according to `mode`
pub fn convert(balance: f64, mode: ConversionMode, ctx: &ConversionContext<'_>) -> EngineResult<IncomeConversion> {
    match mode {
        ConversionMode::LifeAnnuity => life_annuity(balance, ctx),
        ConversionMode::TermCertain { years } => term_certain(balance, years, ctx),
        ConversionMode::ProgrammedWithdrawal { annual_rate } => programmed_withdrawal(balance, annual_rate, ctx),
    }
}

fn check_factor(mode: ConversionMode, factor: f64, epsilon: f64) -> EngineResult<()> {
    if !(factor > epsilon) {
        return Err(EngineError::DegenerateAnnuity {
            mode: mode.to_string(),
            factor,
        });
    }
    Ok(())
}

fn survival_from_current(ctx: &ConversionContext<'_>, age: u32) -> EngineResult<f64> {
    Ok(ctx
        .table
        .survival_probability(ctx.current_age, age - ctx.current_age)?)
}

fn life_annuity(balance: f64, ctx: &ConversionContext<'_>) -> EngineResult<IncomeConversion> {
    let factors = ctx.discount.life_annuity_path(ctx.table, ctx.retirement_age)?;
    let factor = factors[0];
    check_factor(ConversionMode::LifeAnnuity, factor, ctx.epsilon)?;

    let annual_income = balance / factor;
    let mut payouts = Vec::with_capacity(factors.len());
    for (k, remaining_factor) in factors.iter().enumerate() {
        let age = ctx.retirement_age + k as u32;
        payouts.push(PayoutYear {
            age,
            payment: annual_income,
            fund_value: annual_income * remaining_factor,
            survival_probability: survival_from_current(ctx, age)?,
        });
    }

    Ok(IncomeConversion {
        monthly_income: annual_income / ctx.installments_per_year,
        annuity_factor: Some(factor),
        exhaustion_age: None,
        residual_balance: None,
        payouts,
    })
}

fn term_certain(balance: f64, years: u32, ctx: &ConversionContext<'_>) -> EngineResult<IncomeConversion> {
    let mode = ConversionMode::TermCertain { years };
    let factor = ctx.discount.certain_annuity_due(years);
    check_factor(mode, factor, ctx.epsilon)?;

    let annual_income = balance / factor;
    let mut payouts = Vec::with_capacity(years as usize);
    for k in 0..years {
        let age = ctx.retirement_age + k;
        payouts.push(PayoutYear {
            age,
            payment: annual_income,
            fund_value: annual_income * ctx.discount.certain_annuity_due(years - k),
            survival_probability: survival_from_current(ctx, age)?,
        });
    }

    Ok(IncomeConversion {
        monthly_income: annual_income / ctx.installments_per_year,
        annuity_factor: Some(factor),
        exhaustion_age: Some(ctx.retirement_age + years),
        residual_balance: None,
        payouts,
    })
}

fn programmed_withdrawal(balance: f64, rate: f64, ctx: &ConversionContext<'_>) -> EngineResult<IncomeConversion> {
    check_factor(ConversionMode::ProgrammedWithdrawal { annual_rate: rate }, rate, ctx.epsilon)?;

    let expectancy = ctx.table.life_expectancy(ctx.retirement_age)?;
    let horizon = (expectancy.ceil() as u32).max(1);
    let growth = 1.0 + ctx.investment_return_rate;

    let mut remaining = balance;
    let mut exhaustion_age = None;
    let mut payouts = Vec::with_capacity(horizon as usize);
    for k in 0..horizon {
        let age = ctx.retirement_age + k;
        let mut payment = rate * remaining;
        let mut left = remaining - payment;

        // Less than one monthly payment left: pay it out with this year's income
        if left < payment / ctx.installments_per_year {
            payment = remaining;
            left = 0.0;
            exhaustion_age = Some(age);
        }

        remaining = left * growth;
        payouts.push(PayoutYear {
            age,
            payment,
            fund_value: remaining,
            survival_probability: survival_from_current(ctx, age)?,
        });

        if exhaustion_age.is_some() {
            break;
        }
    }

    let first_payment = payouts.first().map(|p| p.payment).unwrap_or_default();
    Ok(IncomeConversion {
        monthly_income: first_payment / ctx.installments_per_year,
        annuity_factor: None,
        exhaustion_age,
        residual_balance: Some(remaining),
        payouts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::Gender;
    use approx::assert_relative_eq;

    fn table() -> MortalityTable {
        let qx: Vec<f64> = (0..=45).map(|k| (0.01 * 1.1_f64.powi(k)).min(1.0)).collect();
        MortalityTable::new("T", Gender::Male, 65, qx, 100_000.0).unwrap() // 65..=110
    }

    fn context(table: &MortalityTable) -> ConversionContext<'_> {
        ConversionContext {
            table,
            current_age: 65,
            retirement_age: 65,
            discount: DiscountCurve::single_rate(0.04),
            investment_return_rate: 0.04,
            installments_per_year: 12.0,
            epsilon: 1e-9,
        }
    }

    #[test]
    fn test_life_annuity_round_trip() {
        let table = table();
        let ctx = context(&table);
        let income = convert(500_000.0, ConversionMode::LifeAnnuity, &ctx).unwrap();

        let factor = income.annuity_factor.unwrap();
        assert!(income.monthly_income > 0.0);
        assert_relative_eq!(income.monthly_income * 12.0 * factor, 500_000.0, max_relative = 1e-6);
        assert_eq!(income.payouts.len(), 46);
        assert_relative_eq!(income.payouts[0].fund_value, 500_000.0, max_relative = 1e-9);
        assert_eq!(income.payouts[0].survival_probability, 1.0);
    }

    #[test]
    fn test_shorter_term_pays_more() {
        let table = table();
        let ctx = context(&table);
        let ten = convert(500_000.0, ConversionMode::TermCertain { years: 10 }, &ctx).unwrap();
        let twenty = convert(500_000.0, ConversionMode::TermCertain { years: 20 }, &ctx).unwrap();

        assert!(ten.monthly_income > twenty.monthly_income);
        assert_eq!(ten.payouts.len(), 10);
        assert_eq!(ten.exhaustion_age, Some(75));

        // First-year reserve is the whole balance
        assert_relative_eq!(ten.payouts[0].fund_value, 500_000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_term_certain_at_zero_rate() {
        let table = table();
        let ctx = ConversionContext {
            discount: DiscountCurve::single_rate(0.0),
            ..context(&table)
        };
        let income = convert(120_000.0, ConversionMode::TermCertain { years: 10 }, &ctx).unwrap();
        assert_relative_eq!(income.monthly_income, 1_000.0);
    }

    #[test]
    fn test_programmed_withdrawal_decreasing_income() {
        let table = table();
        let ctx = context(&table);
        let income = convert(
            400_000.0,
            ConversionMode::ProgrammedWithdrawal { annual_rate: 0.08 },
            &ctx,
        )
        .unwrap();

        let horizon = table.life_expectancy(65).unwrap().ceil() as usize;
        assert_eq!(income.payouts.len(), horizon);
        assert_relative_eq!(income.monthly_income, 400_000.0 * 0.08 / 12.0);
        assert!(income.payouts.windows(2).all(|w| w[1].payment < w[0].payment));
        assert_eq!(income.exhaustion_age, None);
        assert!(income.residual_balance.unwrap() > 0.0);
        assert_eq!(income.annuity_factor, None);
    }

    #[test]
    fn test_programmed_withdrawal_exhaustion() {
        let table = table();
        let ctx = context(&table);
        let income = convert(
            100_000.0,
            ConversionMode::ProgrammedWithdrawal { annual_rate: 0.95 },
            &ctx,
        )
        .unwrap();

        assert_eq!(income.exhaustion_age, Some(65));
        assert_eq!(income.payouts.len(), 1);
        assert_eq!(income.payouts[0].payment, 100_000.0);
        assert_eq!(income.residual_balance, Some(0.0));
    }

    #[test]
    fn test_degenerate_factor_rejected() {
        let table = table();
        let ctx = ConversionContext {
            epsilon: 1e6,
            ..context(&table)
        };
        let err = convert(1_000.0, ConversionMode::LifeAnnuity, &ctx).unwrap_err();
        assert!(matches!(err, EngineError::DegenerateAnnuity { .. }));

        let err = convert(1_000.0, ConversionMode::TermCertain { years: 0 }, &context(&table)).unwrap_err();
        assert!(matches!(err, EngineError::DegenerateAnnuity { .. }));
    }

    proptest::proptest! {
        #[test]
        fn prop_life_annuity_round_trip(
            balance in 1_000.0f64..5_000_000.0,
            rate in 0.0f64..0.12,
        ) {
            let table = table();
            let ctx = ConversionContext {
                discount: DiscountCurve::single_rate(rate),
                ..context(&table)
            };
            let income = convert(balance, ConversionMode::LifeAnnuity, &ctx).unwrap();
            let factor = income.annuity_factor.unwrap();
            let rebuilt = income.monthly_income * 12.0 * factor;
            proptest::prop_assert!(((rebuilt - balance) / balance).abs() < 1e-6);
        }
    }
}
