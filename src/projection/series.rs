//! Year-by-year projection series attached to every simulation result

use serde::{Deserialize, Serialize};

use super::contributions::ContributionYear;

/// Which side of retirement a projection year falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Accumulation,
    Payout,
}

/// A single year of the projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    /// Years since the valuation date, starting at 0
    pub year_offset: u32,
    pub age: u32,

    /// Set when the request carried a valuation date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_year: Option<i32>,

    pub phase: Phase,
    pub monthly_salary: f64,
    pub annual_contribution: f64,

    /// Annual benefit or income paid in the year
    pub benefit_payment: f64,

    /// Fund (CD) or prospective reserve (BD) at the point
    pub fund_value: f64,

    /// Probability of being alive at the start of the year
    pub survival_probability: f64,
}

impl ProjectionPoint {
    pub fn accumulation(year: &ContributionYear, fund_value: f64, survival_probability: f64) -> Self {
        Self {
            year_offset: year.year_offset,
            age: year.age,
            calendar_year: None,
            phase: Phase::Accumulation,
            monthly_salary: year.monthly_salary,
            annual_contribution: year.annual_contribution,
            benefit_payment: 0.0,
            fund_value,
            survival_probability,
        }
    }

    pub fn payout(
        year_offset: u32,
        age: u32,
        benefit_payment: f64,
        fund_value: f64,
        survival_probability: f64,
    ) -> Self {
        Self {
            year_offset,
            age,
            calendar_year: None,
            phase: Phase::Payout,
            monthly_salary: 0.0,
            annual_contribution: 0.0,
            benefit_payment,
            fund_value,
            survival_probability,
        }
    }
}

/// Ordered projection points with contiguous year offsets from 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectionSeries {
    points: Vec<ProjectionPoint>,
}

impl ProjectionSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Append a point; its offset must follow the previous one
    pub fn push(&mut self, point: ProjectionPoint) {
        debug_assert_eq!(point.year_offset as usize, self.points.len());
        self.points.push(point);
    }

    pub fn points(&self) -> &[ProjectionPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ProjectionPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ProjectionPoint> {
        self.points.last()
    }

    /// Points before retirement
    pub fn accumulation(&self) -> impl Iterator<Item = &ProjectionPoint> {
        self.points.iter().filter(|p| p.phase == Phase::Accumulation)
    }

    /// Points from retirement onwards
    pub fn payout(&self) -> impl Iterator<Item = &ProjectionPoint> {
        self.points.iter().filter(|p| p.phase == Phase::Payout)
    }

    /// Whether offsets run 0, 1, 2, ... with ages advancing in step
    pub fn is_contiguous(&self) -> bool {
        self.points
            .iter()
            .enumerate()
            .all(|(idx, p)| p.year_offset as usize == idx)
            && self.points.windows(2).all(|w| w[1].age == w[0].age + 1)
    }

    /// Stamp calendar years counted from the valuation year
    pub fn assign_calendar_years(&mut self, valuation_year: i32) {
        for point in &mut self.points {
            point.calendar_year = Some(valuation_year + point.year_offset as i32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(t: u32) -> ContributionYear {
        ContributionYear {
            year_offset: t,
            age: 60 + t,
            monthly_salary: 1_000.0,
            monthly_contribution: 100.0,
            annual_contribution: 1_200.0,
        }
    }

    #[test]
    fn test_series_phases_and_years() {
        let mut series = ProjectionSeries::new();
        series.push(ProjectionPoint::accumulation(&year(0), 1_200.0, 1.0));
        series.push(ProjectionPoint::accumulation(&year(1), 2_400.0, 0.99));
        series.push(ProjectionPoint::payout(2, 62, 500.0, 2_000.0, 0.98));

        assert!(series.is_contiguous());
        assert_eq!(series.accumulation().count(), 2);
        assert_eq!(series.payout().count(), 1);

        series.assign_calendar_years(2026);
        assert_eq!(series.first().unwrap().calendar_year, Some(2026));
        assert_eq!(series.last().unwrap().calendar_year, Some(2028));
    }

    #[test]
    fn test_point_serialization() {
        let point = ProjectionPoint::payout(0, 65, 12_000.0, 100_000.0, 1.0);
        let json = serde_json::to_value(point).unwrap();

        assert_eq!(json["phase"], "payout");
        assert!(json.get("calendar_year").is_none());
        assert_eq!(json["benefit_payment"], 12_000.0);
    }
}
