//! Aim preview
//!
//! Runs the physics stepper forward from a candidate launch and records the
//! path. Nothing is persisted between calls.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::step;
use super::surface::{Surface, SurfaceKind};
use crate::tuning::Tuning;

/// One predicted position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub pos: Vec2,
    /// 0 at the start of the path, 1 at its last point (drives the preview gradient)
    pub progress: f32,
}

/// Fixed parameters of a prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionParams {
    pub steps: usize,
    pub dt: f32,
    pub gravity: Vec2,
}

impl PredictionParams {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            steps: tuning.physics.prediction_steps,
            dt: tuning.physics.prediction_dt,
            gravity: tuning.physics.gravity,
        }
    }
}

/// Normalized progress of point `i` out of `steps`.
///
/// A single-point path reports 0.
#[inline]
pub fn progress(i: usize, steps: usize) -> f32 {
    if steps <= 1 {
        0.0
    } else {
        i as f32 / (steps - 1) as f32
    }
}

/// Predict `params.steps` positions starting at `start`.
///
/// Point 0 is `start`; each following point is one stepper call further.
/// Sensors are skipped: the preview bounces off solids only.
pub fn predict(
    start: Vec2,
    velocity: Vec2,
    params: &PredictionParams,
    surfaces: &[Surface],
) -> Vec<TrajectoryPoint> {
    let solids: Vec<Surface> = surfaces
        .iter()
        .filter(|s| s.kind == SurfaceKind::Solid)
        .copied()
        .collect();

    let mut points = Vec::with_capacity(params.steps);
    let mut pos = start;
    let mut vel = velocity;
    for i in 0..params.steps {
        points.push(TrajectoryPoint {
            pos,
            progress: progress(i, params.steps),
        });
        let next = step(pos, vel, params.gravity, params.dt, &solids);
        pos = next.pos;
        vel = next.vel;
    }
    points
}
