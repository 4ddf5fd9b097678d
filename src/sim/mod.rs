//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod launch;
pub mod level;
pub mod physics;
pub mod state;
pub mod surface;
pub mod tick;
pub mod trajectory;
pub mod watchdog;

pub use launch::{
    DragGesture, LaunchEvent, LaunchPlan, LaunchScheduler, LaunchVector, ScheduledLaunch, Timer,
    schedule_launch,
};
pub use level::{LevelEngine, double_health_chance, spawn_chance};
pub use physics::{StepResult, SurfaceHit, first_crossing, reflect_velocity, step};
pub use state::{Ball, Block, GameEvent, GamePhase, Hud, LevelState, LossCause};
pub use surface::{Surface, SurfaceKind, SurfaceTag, arena_surfaces, box_surfaces};
pub use tick::{TickInput, tick, validate_dt};
pub use trajectory::{PredictionParams, TrajectoryPoint, predict};
pub use watchdog::{StuckBallWatchdog, StuckState};
