//! Error kinds raised by the simulation core
//!
//! Most of these are recovered locally (clamped, defaulted, logged) so the
//! simulation keeps running. Only `CorruptState` halts a round.

use thiserror::Error;

use crate::sim::GamePhase;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Malformed or missing tuning data; defaults are used instead
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A state invariant was broken and has been repaired
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The caller fed a timestep the simulation clock cannot use
    #[error("timing drift: unusable timestep {0}")]
    TimingDrift(f32),

    /// Operation requested in a phase that does not allow it
    #[error("expected phase {expected:?}, engine is in {actual:?}")]
    PhaseMismatch { expected: GamePhase, actual: GamePhase },

    /// State model can no longer be trusted; the round is halted
    #[error("corrupt simulation state: {0}")]
    CorruptState(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
