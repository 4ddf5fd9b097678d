//! Planar collision surfaces
//!
//! Every collider in the arena is reduced to one-sided line segments. Balls
//! are treated as points, so each surface is pushed out by the ball radius
//! when it is built (a Minkowski sum with the ball, minus the rounded corners).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::SWEEP_EPSILON;
use crate::tuning::ArenaTuning;

/// What a surface belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceTag {
    Wall,
    Paddle,
    Block(u32),
    /// Bottom trigger that destroys balls
    LossLine,
}

/// How a crossing is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// Reflects velocity
    Solid,
    /// Reports the crossing without reflecting
    Sensor,
}

/// A one-sided segment from `a` to `b`, facing along `normal`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Surface {
    pub a: Vec2,
    pub b: Vec2,
    /// Unit normal of the front face (zero for degenerate input, which never collides)
    pub normal: Vec2,
    pub kind: SurfaceKind,
    pub tag: SurfaceTag,
}

impl Surface {
    pub fn solid(a: Vec2, b: Vec2, normal: Vec2, tag: SurfaceTag) -> Self {
        Self {
            a,
            b,
            normal: normal.normalize_or_zero(),
            kind: SurfaceKind::Solid,
            tag,
        }
    }

    pub fn sensor(a: Vec2, b: Vec2, normal: Vec2, tag: SurfaceTag) -> Self {
        Self {
            kind: SurfaceKind::Sensor,
            ..Self::solid(a, b, normal, tag)
        }
    }

    /// Signed distance from the surface line (positive on the front side)
    #[inline]
    pub fn signed_distance(&self, p: Vec2) -> f32 {
        (p - self.a).dot(self.normal)
    }

    /// Sweep a point from `from` to `to` against the front face.
    ///
    /// Returns the sweep fraction and contact point of the crossing. Motion
    /// parallel to the surface, motion away from it, and starts behind it
    /// never produce a crossing.
    pub fn sweep(&self, from: Vec2, to: Vec2) -> Option<(f32, Vec2)> {
        let d = to - from;
        let approach = d.dot(self.normal);
        if approach >= -SWEEP_EPSILON {
            return None;
        }

        let start = self.signed_distance(from);
        if start < -SWEEP_EPSILON {
            return None;
        }

        let t = (-start / approach).max(0.0);
        if t > 1.0 {
            return None;
        }

        let point = from + d * t;
        let edge = self.b - self.a;
        let len_sq = edge.length_squared();
        if len_sq < SWEEP_EPSILON {
            return None;
        }
        let u = (point - self.a).dot(edge) / len_sq;
        let slack = SWEEP_EPSILON.sqrt();
        if u < -slack || u > 1.0 + slack {
            return None;
        }

        Some((t, point))
    }
}

/// The four outward-facing edges of an axis-aligned box
pub fn box_surfaces(center: Vec2, half_extents: Vec2, tag: SurfaceTag) -> [Surface; 4] {
    let min = center - half_extents;
    let max = center + half_extents;
    [
        // top
        Surface::solid(Vec2::new(min.x, max.y), max, Vec2::Y, tag),
        // bottom
        Surface::solid(min, Vec2::new(max.x, min.y), Vec2::NEG_Y, tag),
        // left
        Surface::solid(min, Vec2::new(min.x, max.y), Vec2::NEG_X, tag),
        // right
        Surface::solid(Vec2::new(max.x, min.y), max, Vec2::X, tag),
    ]
}

/// Static arena colliders: side walls, ceiling, paddle top face and loss sensor.
///
/// Order is walls, paddle, loss line; earlier surfaces win sweep ties.
pub fn arena_surfaces(arena: &ArenaTuning, ball_radius: f32, paddle_x: f32) -> Vec<Surface> {
    let r = ball_radius.max(0.0);
    let left = -arena.half_width + r;
    let right = arena.half_width - r;
    let ceiling = arena.top_y - r;
    let floor = arena.loss_line_y - 1.0;

    let mut surfaces = vec![
        Surface::solid(
            Vec2::new(left, floor),
            Vec2::new(left, ceiling),
            Vec2::X,
            SurfaceTag::Wall,
        ),
        Surface::solid(
            Vec2::new(right, floor),
            Vec2::new(right, ceiling),
            Vec2::NEG_X,
            SurfaceTag::Wall,
        ),
        Surface::solid(
            Vec2::new(-arena.half_width, ceiling),
            Vec2::new(arena.half_width, ceiling),
            Vec2::NEG_Y,
            SurfaceTag::Wall,
        ),
    ];

    if arena.paddle_half_width > 0.0 {
        let half = arena.paddle_half_width + r;
        let y = arena.paddle_y + r;
        surfaces.push(Surface::solid(
            Vec2::new(paddle_x - half, y),
            Vec2::new(paddle_x + half, y),
            Vec2::Y,
            SurfaceTag::Paddle,
        ));
    }

    surfaces.push(Surface::sensor(
        Vec2::new(-arena.half_width - 1.0, arena.loss_line_y),
        Vec2::new(arena.half_width + 1.0, arena.loss_line_y),
        Vec2::Y,
        SurfaceTag::LossLine,
    ));

    surfaces
}

/// Clamp a paddle centre so the paddle keeps its padding from the side walls
pub fn clamp_paddle_x(arena: &ArenaTuning, x: f32) -> f32 {
    let limit = (arena.half_width - arena.paddle_half_width - arena.paddle_padding).max(0.0);
    if x.is_finite() { x.clamp(-limit, limit) } else { 0.0 }
}
