//! Data-driven game balance
//!
//! Every value has a playable default, so a tuning file
//! only needs the fields it wants to change.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clamp_probability;
use crate::error::{Result, SimError};

/// Point-mass physics and prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Constant acceleration applied to every simulated ball
    pub gravity: Vec2,
    /// Ball radius (surfaces are inflated by this so balls act as points)
    pub ball_radius: f32,
    /// Extra push along the surface normal on every solid bounce of a live ball
    pub bounce_force: f32,
    /// Timestep used for aim preview
    pub prediction_dt: f32,
    /// Number of preview points
    pub prediction_steps: usize,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            ball_radius: 0.1,
            bounce_force: 10.0,
            prediction_dt: 0.02,
            prediction_steps: 30,
        }
    }
}

/// Drag-to-launch and multi-ball stagger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchTuning {
    /// Drag length to impulse multiplier
    pub launch_force: f32,
    /// Hard cap on launch impulse magnitude
    pub max_launch_force: f32,
    /// Seconds between staggered balls
    pub stagger_interval: f32,
}

impl Default for LaunchTuning {
    fn default() -> Self {
        Self {
            launch_force: 15.0,
            max_launch_force: 20.0,
            stagger_interval: 0.3,
        }
    }
}

/// Stuck-ball detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogTuning {
    /// Seconds between speed samples
    pub check_interval: f32,
    /// Speeds below this count as stuck
    pub min_speed: f32,
    /// Seconds below `min_speed` before a ball is evicted
    pub stuck_timeout: f32,
}

impl Default for WatchdogTuning {
    fn default() -> Self {
        Self {
            check_interval: 1.0,
            min_speed: 0.1,
            stuck_timeout: 5.0,
        }
    }
}

/// Block row layout and difficulty curve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockTuning {
    pub blocks_per_row: u32,
    pub spacing_x: f32,
    /// Vertical distance of one row descent
    pub spacing_y: f32,
    /// Edge length of a square block
    pub size: f32,
    /// Height at which new rows appear
    pub spawn_y: f32,
    pub initial_spawn_chance: f32,
    /// Added to the spawn chance every 10 levels
    pub spawn_chance_increment: f32,
    /// From this level on, `double_health_chance_high` applies
    pub double_health_level: u32,
    pub double_health_chance_low: f32,
    pub double_health_chance_high: f32,
}

impl Default for BlockTuning {
    fn default() -> Self {
        Self {
            blocks_per_row: 9,
            spacing_x: 0.5,
            spacing_y: 1.0,
            size: 0.45,
            spawn_y: 4.0,
            initial_spawn_chance: 0.2,
            spawn_chance_increment: 0.05,
            double_health_level: 50,
            double_health_chance_low: 0.01,
            double_health_chance_high: 0.35,
        }
    }
}

/// Arena bounds, paddle and loss thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    /// Side walls sit at +/- this x
    pub half_width: f32,
    pub top_y: f32,
    /// Balls crossing this line are lost
    pub loss_line_y: f32,
    /// Where queued balls wait
    pub spawn_point: Vec2,
    pub paddle_y: f32,
    /// Zero or negative disables the paddle
    pub paddle_half_width: f32,
    /// Gap the paddle keeps from each side wall
    pub paddle_padding: f32,
    /// A block at or below this height after descent ends the game
    pub game_over_y: f32,
    /// Continue-recovery removes blocks at or below this height
    pub continue_clear_y: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            half_width: 2.5,
            top_y: 5.0,
            loss_line_y: -6.0,
            spawn_point: Vec2::new(0.0, -5.0),
            paddle_y: -5.5,
            paddle_half_width: 0.5,
            paddle_padding: 0.5,
            game_over_y: -5.0,
            continue_clear_y: -4.0,
        }
    }
}

/// Complete tuning set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub launch: LaunchTuning,
    pub watchdog: WatchdogTuning,
    pub blocks: BlockTuning,
    pub arena: ArenaTuning,
}

impl Tuning {
    /// Parse a JSON tuning document (missing fields keep their defaults)
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Load tuning from a file, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path)
            .map_err(SimError::from)
            .and_then(|json| Self::from_json(&json))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(err) => {
                log::warn!("{err} ({}), using default tuning", path.display());
                Self::default()
            }
        }
    }

    /// Clamp out-of-range values instead of rejecting them
    pub fn sanitized(mut self) -> Self {
        let b = &mut self.blocks;
        for (name, p) in [
            ("initial_spawn_chance", &mut b.initial_spawn_chance),
            ("double_health_chance_low", &mut b.double_health_chance_low),
            ("double_health_chance_high", &mut b.double_health_chance_high),
        ] {
            let clamped = clamp_probability(*p);
            if clamped != *p {
                log::warn!("blocks.{name} = {} clamped to {clamped}", *p);
                *p = clamped;
            }
        }
        if !b.spawn_chance_increment.is_finite() {
            log::warn!("blocks.spawn_chance_increment is not finite, using 0");
            b.spawn_chance_increment = 0.0;
        }
        if b.blocks_per_row == 0 {
            log::warn!("blocks.blocks_per_row = 0, using 1");
            b.blocks_per_row = 1;
        }

        let defaults = Tuning::default();
        fix_positive(
            "launch.stagger_interval",
            &mut self.launch.stagger_interval,
            defaults.launch.stagger_interval,
        );
        fix_positive(
            "watchdog.check_interval",
            &mut self.watchdog.check_interval,
            defaults.watchdog.check_interval,
        );
        fix_positive(
            "physics.prediction_dt",
            &mut self.physics.prediction_dt,
            defaults.physics.prediction_dt,
        );
        if !(self.physics.bounce_force.is_finite() && self.physics.bounce_force >= 0.0) {
            log::warn!(
                "physics.bounce_force = {} reset to {}",
                self.physics.bounce_force,
                defaults.physics.bounce_force
            );
            self.physics.bounce_force = defaults.physics.bounce_force;
        }
        if !(self.arena.paddle_padding.is_finite() && self.arena.paddle_padding >= 0.0) {
            log::warn!("arena.paddle_padding = {} reset to 0", self.arena.paddle_padding);
            self.arena.paddle_padding = 0.0;
        }
        if !(self.launch.max_launch_force.is_finite() && self.launch.max_launch_force >= 0.0) {
            log::warn!(
                "launch.max_launch_force = {} reset to {}",
                self.launch.max_launch_force,
                defaults.launch.max_launch_force
            );
            self.launch.max_launch_force = defaults.launch.max_launch_force;
        }
        self
    }
}

fn fix_positive(name: &str, value: &mut f32, default: f32) {
    if !(value.is_finite() && *value > 0.0) {
        log::warn!("{name} = {} must be positive, using {default}", *value);
        *value = default;
    }
}
