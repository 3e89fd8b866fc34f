//! Annual projection building blocks shared by the BD and CD calculators

mod contributions;
mod discount;
mod series;

pub use contributions::{ContributionProjector, ContributionSchedule, ContributionYear};
pub use discount::DiscountCurve;
pub use series::{Phase, ProjectionPoint, ProjectionSeries};
