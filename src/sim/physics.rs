//! Point-mass integration with single-bounce reflection
//!
//! One function does all the work: [`step`]. It is pure, so live balls and
//! the aim preview go through exactly the same code.

use glam::Vec2;

use super::surface::{Surface, SurfaceKind, SurfaceTag};
use crate::consts::SWEEP_EPSILON;

/// The surface crossing resolved during a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Index into the surface slice passed to [`step`]
    pub index: usize,
    pub tag: SurfaceTag,
    pub kind: SurfaceKind,
    pub point: Vec2,
    pub normal: Vec2,
    /// Fraction of the swept segment travelled before contact
    pub t: f32,
}

/// Outcome of one integration step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    pub pos: Vec2,
    pub vel: Vec2,
    pub hit: Option<SurfaceHit>,
}

impl StepResult {
    /// True if a solid surface reflected the body this step
    pub fn bounced(&self) -> bool {
        matches!(self.hit, Some(hit) if hit.kind == SurfaceKind::Solid)
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Earliest front-face crossing of the segment `from -> to`.
///
/// Ties within [`SWEEP_EPSILON`] go to the surface listed first.
pub fn first_crossing(from: Vec2, to: Vec2, surfaces: &[Surface]) -> Option<SurfaceHit> {
    let mut best: Option<SurfaceHit> = None;
    for (index, surface) in surfaces.iter().enumerate() {
        let Some((t, point)) = surface.sweep(from, to) else {
            continue;
        };
        if best.is_some_and(|b| t >= b.t - SWEEP_EPSILON) {
            continue;
        }
        best = Some(SurfaceHit {
            index,
            tag: surface.tag,
            kind: surface.kind,
            point,
            normal: surface.normal,
            t,
        });
    }
    best
}

/// Advance a point mass by `dt`.
///
/// Position is integrated with the incoming velocity, then gravity is added
/// to the velocity. If the swept segment crosses a surface, the body is put
/// on the contact point; solid surfaces also reflect the new velocity.
/// At most one surface is resolved per step.
pub fn step(pos: Vec2, vel: Vec2, gravity: Vec2, dt: f32, surfaces: &[Surface]) -> StepResult {
    let next_pos = pos + vel * dt;
    let next_vel = vel + gravity * dt;

    match first_crossing(pos, next_pos, surfaces) {
        Some(hit) => {
            let vel = match hit.kind {
                SurfaceKind::Solid => reflect_velocity(next_vel, hit.normal),
                SurfaceKind::Sensor => next_vel,
            };
            StepResult {
                pos: hit.point,
                vel,
                hit: Some(hit),
            }
        }
        None => StepResult {
            pos: next_pos,
            vel: next_vel,
            hit: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::surface::box_surfaces;

    const GRAVITY: Vec2 = Vec2::new(0.0, -9.81);

    fn ground() -> Surface {
        Surface::solid(
            Vec2::new(-10.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::Y,
            SurfaceTag::Wall,
        )
    }

    #[test]
    fn test_reflect_velocity() {
        // Ball moving right, hits vertical wall (normal pointing left)
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_position_updates_before_velocity() {
        let r = step(Vec2::ZERO, Vec2::new(1.0, 0.0), GRAVITY, 0.5, &[]);
        // Position uses the old velocity, so gravity has no effect on it yet
        assert_eq!(r.pos, Vec2::new(0.5, 0.0));
        assert!((r.vel.y - (-4.905)).abs() < 1e-5);
        assert!(r.hit.is_none());
        assert!(!r.bounced());
    }

    #[test]
    fn test_bounce_lands_on_contact_point() {
        let r = step(Vec2::new(0.0, 1.0), Vec2::new(2.0, -4.0), Vec2::ZERO, 0.5, &[ground()]);
        assert!(r.bounced());
        assert!(r.pos.distance(Vec2::new(0.5, 0.0)) < 1e-5);
        assert!(r.vel.distance(Vec2::new(2.0, 4.0)) < 1e-5);
    }

    #[test]
    fn test_reflects_post_gravity_velocity() {
        let r = step(Vec2::new(0.0, 0.1), Vec2::new(0.0, -1.0), GRAVITY, 0.2, &[ground()]);
        assert!(r.bounced());
        let expected = 1.0 + 9.81 * 0.2;
        assert!((r.vel.y - expected).abs() < 1e-4);
    }

    #[test]
    fn test_sensor_reports_without_reflecting() {
        let line = Surface::sensor(
            Vec2::new(-10.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::Y,
            SurfaceTag::LossLine,
        );
        let r = step(Vec2::new(0.0, 1.0), Vec2::new(0.0, -4.0), Vec2::ZERO, 0.5, &[line]);
        assert!(!r.bounced());
        assert_eq!(r.hit.unwrap().tag, SurfaceTag::LossLine);
        assert_eq!(r.vel, Vec2::new(0.0, -4.0));
    }

    #[test]
    fn test_earliest_surface_wins() {
        let near = Surface::solid(
            Vec2::new(-1.0, 0.5),
            Vec2::new(1.0, 0.5),
            Vec2::Y,
            SurfaceTag::Block(2),
        );
        let r = step(Vec2::new(0.0, 1.0), Vec2::new(0.0, -4.0), Vec2::ZERO, 1.0, &[ground(), near]);
        let hit = r.hit.unwrap();
        assert_eq!(hit.tag, SurfaceTag::Block(2));
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn test_tie_goes_to_first_surface() {
        let twin = Surface::solid(
            Vec2::new(-10.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::Y,
            SurfaceTag::Paddle,
        );
        let r = step(Vec2::new(0.0, 1.0), Vec2::new(0.0, -4.0), Vec2::ZERO, 1.0, &[ground(), twin]);
        assert_eq!(r.hit.unwrap().tag, SurfaceTag::Wall);
    }

    #[test]
    fn test_single_bounce_per_step() {
        // Moving fast enough to cross both the block top and the ground in one step
        let block = box_surfaces(Vec2::new(0.0, 2.0), Vec2::splat(0.5), SurfaceTag::Block(1));
        let mut surfaces = block.to_vec();
        surfaces.push(ground());
        let r = step(Vec2::new(0.0, 4.0), Vec2::new(0.0, -10.0), Vec2::ZERO, 1.0, &surfaces);
        assert_eq!(r.hit.unwrap().tag, SurfaceTag::Block(1));
        assert!((r.pos.y - 2.5).abs() < 1e-5);
        assert!(r.vel.y > 0.0);
    }

    #[test]
    fn test_no_surfaces_degrades_to_free_flight() {
        let r = step(Vec2::ONE, Vec2::new(3.0, 0.0), Vec2::ZERO, 1.0, &[]);
        assert_eq!(r.pos, Vec2::new(4.0, 1.0));
        assert!(!r.bounced());
    }

    #[test]
    fn test_leaving_contact_point_does_not_rebounce() {
        let first = step(Vec2::new(0.0, 1.0), Vec2::new(0.0, -4.0), Vec2::ZERO, 0.5, &[ground()]);
        assert!(first.bounced());
        let second = step(first.pos, first.vel, Vec2::ZERO, 0.5, &[ground()]);
        assert!(second.hit.is_none());
        assert!(second.pos.y > 0.0);
    }
}
