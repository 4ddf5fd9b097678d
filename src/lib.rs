//! Ball Cascade - simulation core for a multi-ball brick breaker
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, prediction, launch stagger, watchdog, levels)
//! - `tuning`: Data-driven game balance
//! - `error`: Error kinds surfaced by the simulation
//!
//! Rendering, audio, input capture and ad mediation live outside this crate.
//! They talk to the core through [`sim::TickInput`], [`sim::GameEvent`] and
//! [`sim::LevelEngine::on_continue_granted`].

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{Result, SimError};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Sweep fractions closer than this are treated as the same contact
    pub const SWEEP_EPSILON: f32 = 1e-6;
    /// Balls further than this outside the arena are considered escaped
    pub const ESCAPE_MARGIN: f32 = 1.0;
    /// Undrained engine events kept before the oldest are discarded
    pub const MAX_BUFFERED_EVENTS: usize = 1024;
}

/// Clamp a probability into [0, 1], mapping NaN to 0
#[inline]
pub fn clamp_probability(p: f32) -> f32 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

/// True if both components are finite
#[inline]
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
