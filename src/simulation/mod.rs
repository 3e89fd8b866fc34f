//! Request handling: validation, plan dispatch and the unified result

mod orchestrator;
mod request;
mod result;

pub use orchestrator::{SimulationOrchestrator, ValidatedRequest};
pub use request::SimulationRequest;
pub use result::{PlanResult, SimulationResult, SimulationSummary, SummaryDelta};
