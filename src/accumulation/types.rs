//! Result type for CD projections

use serde::Serialize;

use crate::assumptions::ConversionMode;
use crate::projection::ProjectionSeries;

/// Outcome of a CD projection and income conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdResult {
    /// Balance at retirement
    pub projected_balance: f64,

    pub monthly_income: f64,

    pub conversion_mode_used: ConversionMode,

    /// Life or certain annuity-due factor used by the conversion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annuity_factor: Option<f64>,

    /// Age at which the income stops before the end of life
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhaustion_age: Option<u32>,

    /// Balance left at the programmed-withdrawal horizon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual_balance: Option<f64>,

    /// Undiscounted contributions paid until retirement
    pub total_contributions: f64,

    pub projection_series: ProjectionSeries,
}
