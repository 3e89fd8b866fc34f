//! Pension Sim - Actuarial simulation engine for BD and CD retirement plans
//!
//! This library provides:
//! - Mortality tables with survival curves and life expectancy
//! - Salary and contribution projections
//! - Defined-benefit reserve valuation (RMBA, sufficiency, equilibrium suggestions)
//! - Defined-contribution accumulation and income conversion
//! - Sensitivity sweeps over assumption grids

pub mod accumulation;
pub mod assumptions;
pub mod config;
pub mod deadline;
pub mod error;
pub mod participant;
pub mod projection;
pub mod reserves;
pub mod sensitivity;
pub mod simulation;

// Re-export commonly used types
pub use accumulation::{CdBalanceProjector, CdResult};
pub use assumptions::{
    AssumptionInput, AssumptionSet, BenefitTarget, BenefitTargetMode, ConversionMode, MortalityRegistry,
    MortalityTable, NamedCsvTable,
};
pub use config::EngineConfig;
pub use deadline::Deadline;
pub use error::{EngineError, EngineResult, MortalityError, ValidationErrors, Violation};
pub use participant::{Gender, Participant, PlanType};
pub use projection::{ProjectionPoint, ProjectionSeries};
pub use reserves::{BdReserveCalculator, BdResult, SufficiencyStatus};
pub use sensitivity::{SensitivityAnalyzer, SensitivityAxis, SensitivityParameter, SensitivityReport, SensitivityRequest};
pub use simulation::{SimulationOrchestrator, SimulationRequest, SimulationResult, SimulationSummary};
