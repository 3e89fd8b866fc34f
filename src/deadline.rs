//! Caller-supplied deadline for the bounded loops of the engine

use std::time::{Duration, Instant};

use crate::error::{EngineError, EngineResult};

/// Point in time after which long-running work gives up
///
/// Copy-able so it can be handed to every worker of a parallel sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// Never expires
    pub fn none() -> Self {
        Self { at: None }
    }

    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Some(Instant::now() + timeout),
        }
    }

    pub fn at(instant: Instant) -> Self {
        Self { at: Some(instant) }
    }

    pub fn is_expired(&self) -> bool {
        self.at.map_or(false, |at| Instant::now() >= at)
    }

    /// `DeadlineExceeded` once the deadline has passed
    pub fn check(&self) -> EngineResult<()> {
        if self.is_expired() {
            Err(EngineError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }

    /// Time left, `None` for an open-ended deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_deadline_never_expires() {
        let deadline = Deadline::none();
        assert!(deadline.check().is_ok());
        assert_eq!(deadline.remaining(), None);
    }

    #[test]
    fn test_past_deadline_expired() {
        let deadline = Deadline::at(Instant::now());
        assert!(deadline.is_expired());
        assert_eq!(deadline.check(), Err(EngineError::DeadlineExceeded));
        assert_eq!(deadline.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_future_deadline() {
        let deadline = Deadline::after(Duration::from_secs(3600));
        assert!(deadline.check().is_ok());
        assert!(deadline.remaining().unwrap() > Duration::from_secs(3000));
    }
}
