//! Plan-specific assumption variants: benefit target and CD conversion mode

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the BD benefit target is expressed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BenefitTargetMode {
    /// Fixed monthly amount
    FixedValue,
    /// Fraction of final salary
    ReplacementRate,
}

/// Target retirement benefit of a BD plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BenefitTarget {
    FixedValue { monthly_amount: f64 },
    ReplacementRate { rate: f64 },
}

impl BenefitTarget {
    pub fn new(mode: BenefitTargetMode, value: f64) -> Self {
        match mode {
            BenefitTargetMode::FixedValue => BenefitTarget::FixedValue { monthly_amount: value },
            BenefitTargetMode::ReplacementRate => BenefitTarget::ReplacementRate { rate: value },
        }
    }

    pub fn mode(&self) -> BenefitTargetMode {
        match self {
            BenefitTarget::FixedValue { .. } => BenefitTargetMode::FixedValue,
            BenefitTarget::ReplacementRate { .. } => BenefitTargetMode::ReplacementRate,
        }
    }

    /// The raw target value (currency or fraction, depending on mode)
    pub fn value(&self) -> f64 {
        match *self {
            BenefitTarget::FixedValue { monthly_amount } => monthly_amount,
            BenefitTarget::ReplacementRate { rate } => rate,
        }
    }

    /// Same mode, different value
    pub fn with_value(&self, value: f64) -> Self {
        Self::new(self.mode(), value)
    }

    /// Monthly benefit given the final monthly salary
    pub fn monthly_benefit(&self, final_monthly_salary: f64) -> f64 {
        match *self {
            BenefitTarget::FixedValue { monthly_amount } => monthly_amount,
            BenefitTarget::ReplacementRate { rate } => rate * final_monthly_salary,
        }
    }
}

/// How a CD balance is converted into retirement income
///
/// Accepts either a code string (`"LIFE_ANNUITY"`, `"ACTUARIAL"`,
/// `"CERTAIN_10Y"`, `"TERM_CERTAIN_15"`, `"PROGRAMMED_5PCT"`) or a tagged
/// object (`{"mode": "TERM_CERTAIN", "years": 10}`). Serializes as the
/// tagged object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "mode",
    rename_all = "SCREAMING_SNAKE_CASE",
    try_from = "ConversionModeRepr"
)]
pub enum ConversionMode {
    /// Mortality-weighted annuity for life
    LifeAnnuity,
    /// Fixed payments for a number of years, no mortality
    TermCertain { years: u32 },
    /// Withdraw a fixed fraction of the remaining balance each year
    ProgrammedWithdrawal { annual_rate: f64 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConversionModeRepr {
    Code(String),
    Tagged(TaggedConversionMode),
}

#[derive(Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
enum TaggedConversionMode {
    #[serde(alias = "ACTUARIAL")]
    LifeAnnuity,
    #[serde(alias = "TERM_CERTAIN_N")]
    TermCertain { years: u32 },
    ProgrammedWithdrawal { annual_rate: f64 },
}

impl TryFrom<ConversionModeRepr> for ConversionMode {
    type Error = String;

    fn try_from(repr: ConversionModeRepr) -> Result<Self, Self::Error> {
        match repr {
            ConversionModeRepr::Code(code) => code.parse(),
            ConversionModeRepr::Tagged(TaggedConversionMode::LifeAnnuity) => Ok(ConversionMode::LifeAnnuity),
            ConversionModeRepr::Tagged(TaggedConversionMode::TermCertain { years }) => {
                Ok(ConversionMode::TermCertain { years })
            }
            ConversionModeRepr::Tagged(TaggedConversionMode::ProgrammedWithdrawal { annual_rate }) => {
                Ok(ConversionMode::ProgrammedWithdrawal { annual_rate })
            }
        }
    }
}

impl std::str::FromStr for ConversionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();

        match code.as_str() {
            "LIFE_ANNUITY" | "ACTUARIAL" => return Ok(ConversionMode::LifeAnnuity),
            "TERM_CERTAIN" | "TERM_CERTAIN_N" => {
                return Err(format!("{} needs a term, e.g. CERTAIN_10Y", code))
            }
            "PROGRAMMED_WITHDRAWAL" => {
                return Err(format!("{} needs a rate, e.g. PROGRAMMED_5PCT", code))
            }
            _ => {}
        }

        let years = code
            .strip_prefix("CERTAIN_")
            .and_then(|rest| rest.strip_suffix('Y'))
            .or_else(|| code.strip_prefix("TERM_CERTAIN_"));
        if let Some(years) = years {
            return years
                .parse::<u32>()
                .map(|years| ConversionMode::TermCertain { years })
                .map_err(|_| format!("invalid term in conversion mode {}", code));
        }

        if let Some(pct) = code
            .strip_prefix("PROGRAMMED_")
            .and_then(|rest| rest.strip_suffix("PCT"))
        {
            return pct
                .parse::<f64>()
                .map(|pct| ConversionMode::ProgrammedWithdrawal { annual_rate: pct / 100.0 })
                .map_err(|_| format!("invalid percentage in conversion mode {}", code));
        }

        Err(format!("Unknown conversion mode: {}", code))
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionMode::LifeAnnuity => write!(f, "LIFE_ANNUITY"),
            ConversionMode::TermCertain { years } => write!(f, "CERTAIN_{}Y", years),
            ConversionMode::ProgrammedWithdrawal { annual_rate } => {
                write!(f, "PROGRAMMED_{}PCT", (annual_rate * 1e4).round() / 100.0)
            }
        }
    }
}
