//! Participant data structures and batch loading

mod data;
pub mod loader;

pub use data::{Gender, Participant, PlanType};
pub use loader::{load_participants, load_participants_from_reader, BatchParticipant};
