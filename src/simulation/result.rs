//! Unified simulation result and its compact summary

use chrono::NaiveDate;
use serde::Serialize;

use crate::accumulation::CdResult;
use crate::participant::PlanType;
use crate::projection::ProjectionSeries;
use crate::reserves::{BdResult, SufficiencyStatus};

/// Plan-specific part of a result, tagged by plan type on the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "plan_type")]
pub enum PlanResult {
    #[serde(rename = "BD")]
    DefinedBenefit(BdResult),
    #[serde(rename = "CD")]
    DefinedContribution(CdResult),
}

impl PlanResult {
    pub fn plan_type(&self) -> PlanType {
        match self {
            PlanResult::DefinedBenefit(_) => PlanType::DefinedBenefit,
            PlanResult::DefinedContribution(_) => PlanType::DefinedContribution,
        }
    }

    pub fn projection_series(&self) -> &ProjectionSeries {
        match self {
            PlanResult::DefinedBenefit(bd) => &bd.projection_series,
            PlanResult::DefinedContribution(cd) => &cd.projection_series,
        }
    }

    pub(crate) fn projection_series_mut(&mut self) -> &mut ProjectionSeries {
        match self {
            PlanResult::DefinedBenefit(bd) => &mut bd.projection_series,
            PlanResult::DefinedContribution(cd) => &mut cd.projection_series,
        }
    }
}

/// Result of one simulation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    #[serde(flatten)]
    pub plan: PlanResult,

    /// Table the result was computed with
    pub mortality_table: String,

    /// Curtate life expectancy at the current age
    pub life_expectancy: f64,

    pub life_expectancy_at_retirement: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub valuation_date: Option<NaiveDate>,
}

impl SimulationResult {
    pub fn plan_type(&self) -> PlanType {
        self.plan.plan_type()
    }

    pub fn as_bd(&self) -> Option<&BdResult> {
        match &self.plan {
            PlanResult::DefinedBenefit(bd) => Some(bd),
            PlanResult::DefinedContribution(_) => None,
        }
    }

    pub fn as_cd(&self) -> Option<&CdResult> {
        match &self.plan {
            PlanResult::DefinedContribution(cd) => Some(cd),
            PlanResult::DefinedBenefit(_) => None,
        }
    }

    pub fn projection_series(&self) -> &ProjectionSeries {
        self.plan.projection_series()
    }

    /// Headline figures without the projection series
    pub fn summary(&self) -> SimulationSummary {
        match &self.plan {
            PlanResult::DefinedBenefit(bd) => SimulationSummary::DefinedBenefit {
                rmba: bd.rmba,
                pv_contributions: bd.pv_contributions,
                pv_benefits: bd.pv_benefits,
                sufficiency: bd.sufficiency,
                sufficiency_status: bd.sufficiency_status,
                suggested_contribution_rate: bd.suggested_contribution_rate,
            },
            PlanResult::DefinedContribution(cd) => SimulationSummary::DefinedContribution {
                projected_balance: cd.projected_balance,
                monthly_income: cd.monthly_income,
            },
        }
    }
}

/// Headline figures of a result, used by sensitivity sweeps and batch runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "plan_type")]
pub enum SimulationSummary {
    #[serde(rename = "BD")]
    DefinedBenefit {
        rmba: f64,
        pv_contributions: f64,
        pv_benefits: f64,
        sufficiency: f64,
        sufficiency_status: SufficiencyStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        suggested_contribution_rate: Option<f64>,
    },
    #[serde(rename = "CD")]
    DefinedContribution { projected_balance: f64, monthly_income: f64 },
}

/// Scenario minus base, per metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "plan_type")]
pub enum SummaryDelta {
    #[serde(rename = "BD")]
    DefinedBenefit {
        rmba: f64,
        pv_contributions: f64,
        pv_benefits: f64,
        sufficiency: f64,
    },
    #[serde(rename = "CD")]
    DefinedContribution { projected_balance: f64, monthly_income: f64 },
}

impl SimulationSummary {
    /// `self - base`; `None` when the plan types differ
    pub fn delta(&self, base: &SimulationSummary) -> Option<SummaryDelta> {
        match (self, base) {
            (
                SimulationSummary::DefinedBenefit {
                    rmba,
                    pv_contributions,
                    pv_benefits,
                    sufficiency,
                    ..
                },
                SimulationSummary::DefinedBenefit {
                    rmba: base_rmba,
                    pv_contributions: base_pvc,
                    pv_benefits: base_pvb,
                    sufficiency: base_sufficiency,
                    ..
                },
            ) => Some(SummaryDelta::DefinedBenefit {
                rmba: rmba - base_rmba,
                pv_contributions: pv_contributions - base_pvc,
                pv_benefits: pv_benefits - base_pvb,
                sufficiency: sufficiency - base_sufficiency,
            }),
            (
                SimulationSummary::DefinedContribution {
                    projected_balance,
                    monthly_income,
                },
                SimulationSummary::DefinedContribution {
                    projected_balance: base_balance,
                    monthly_income: base_income,
                },
            ) => Some(SummaryDelta::DefinedContribution {
                projected_balance: projected_balance - base_balance,
                monthly_income: monthly_income - base_income,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_delta() {
        let base = SimulationSummary::DefinedContribution {
            projected_balance: 100.0,
            monthly_income: 10.0,
        };
        let scenario = SimulationSummary::DefinedContribution {
            projected_balance: 150.0,
            monthly_income: 12.5,
        };

        assert_eq!(
            scenario.delta(&base),
            Some(SummaryDelta::DefinedContribution {
                projected_balance: 50.0,
                monthly_income: 2.5
            })
        );

        let bd = SimulationSummary::DefinedBenefit {
            rmba: 1.0,
            pv_contributions: 1.0,
            pv_benefits: 2.0,
            sufficiency: -1.0,
            sufficiency_status: SufficiencyStatus::Deficit,
            suggested_contribution_rate: None,
        };
        assert_eq!(bd.delta(&base), None);
        assert!(matches!(
            bd.delta(&bd),
            Some(SummaryDelta::DefinedBenefit { rmba, .. }) if rmba == 0.0
        ));
    }

    #[test]
    fn test_summary_wire_form() {
        let summary = SimulationSummary::DefinedContribution {
            projected_balance: 1.0,
            monthly_income: 2.0,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["plan_type"], "CD");
        assert_eq!(json["monthly_income"], 2.0);
    }
}
