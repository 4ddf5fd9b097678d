//! Launch vectors and the staggered multi-ball release
//!
//! The head ball flies as soon as the player lets go. Every extra ball is
//! parked at the spawn point with collisions off, then released with the same
//! impulse one stagger interval later, which makes the volley trail the first
//! ball instead of clumping.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::LaunchTuning;

/// A clamped launch impulse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchVector {
    /// Unit direction (zero when the drag had no length)
    pub direction: Vec2,
    /// Impulse magnitude in [0, max force]
    pub magnitude: f32,
}

impl LaunchVector {
    pub const ZERO: Self = Self {
        direction: Vec2::ZERO,
        magnitude: 0.0,
    };

    /// Build a launch vector, clamping the magnitude into [0, max_force]
    pub fn new(direction: Vec2, magnitude: f32, max_force: f32) -> Self {
        let direction = direction.normalize_or_zero();
        let magnitude = if magnitude.is_finite() {
            magnitude.clamp(0.0, max_force.max(0.0))
        } else {
            0.0
        };
        Self {
            direction,
            magnitude: if direction == Vec2::ZERO { 0.0 } else { magnitude },
        }
    }

    /// Slingshot launch: the ball flies from the drag end back toward the drag start
    pub fn from_drag(start: Vec2, end: Vec2, tuning: &LaunchTuning) -> Self {
        let pull = start - end;
        Self::new(
            pull,
            pull.length() * tuning.launch_force,
            tuning.max_launch_force,
        )
    }

    /// Impulse applied to a unit-mass ball
    #[inline]
    pub fn impulse(&self) -> Vec2 {
        self.direction * self.magnitude
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.magnitude == 0.0
    }
}

/// Drag gesture in world coordinates, as delivered by the input layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragGesture {
    pub start: Vec2,
    pub end: Vec2,
}

/// Timing of one staggered ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledLaunch {
    pub index: u32,
    /// Seconds after the head launch when the ball is parked at the spawn point
    pub spawn_at: f32,
    /// Seconds after the head launch when it receives the impulse
    pub release_at: f32,
}

/// Lazy sequence of staggered launches
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub vector: LaunchVector,
    count: u32,
    next: u32,
    interval: f32,
}

impl Iterator for LaunchPlan {
    type Item = ScheduledLaunch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(ScheduledLaunch {
            index,
            spawn_at: index as f32 * self.interval,
            release_at: (index + 1) as f32 * self.interval,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.count - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for LaunchPlan {}

/// Plan the release of `ball_count` extra balls behind the head ball
pub fn schedule_launch(vector: LaunchVector, ball_count: u32, interval: f32) -> LaunchPlan {
    LaunchPlan {
        vector,
        count: ball_count,
        next: 0,
        interval,
    }
}

/// Countdown driven by simulation time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Timer {
    #[default]
    Idle,
    CountingDown(f32),
    Fired,
}

impl Timer {
    /// Advance by `dt`; returns true on the tick the countdown reaches zero
    pub fn advance(&mut self, dt: f32) -> bool {
        if let Timer::CountingDown(remaining) = *self {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                *self = Timer::Fired;
                return true;
            }
            *self = Timer::CountingDown(remaining);
        }
        false
    }

    /// Start counting down from `seconds` (overshoot from a previous firing is dropped)
    pub fn arm(&mut self, seconds: f32) {
        *self = Timer::CountingDown(seconds);
    }
}

/// What the scheduler asks the engine to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaunchEvent {
    /// Park a new ball at the spawn point, collisions off
    Spawn { index: u32 },
    /// Give the parked ball its impulse and enable collisions
    Release { index: u32, impulse: Vec2 },
}

/// Tick-driven runner for a [`LaunchPlan`]
#[derive(Debug, Clone, Default)]
pub struct LaunchScheduler {
    plan: Option<LaunchPlan>,
    /// Ball parked and waiting for its release
    parked: Option<ScheduledLaunch>,
    timer: Timer,
    interval: f32,
}

impl LaunchScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a new volley; any unfinished previous volley is discarded
    pub fn start(&mut self, vector: LaunchVector, ball_count: u32, interval: f32) {
        self.cancel();
        if ball_count == 0 {
            return;
        }
        log::debug!(
            "Scheduling {} staggered balls every {:.2}s (impulse {:.2})",
            ball_count,
            interval,
            vector.magnitude
        );
        self.plan = Some(schedule_launch(vector, ball_count, interval));
        self.interval = interval;
        // First extra ball is parked immediately
        self.timer = Timer::Fired;
    }

    /// Drop everything still pending
    pub fn cancel(&mut self) {
        if self.is_active() {
            log::debug!("Launch volley cancelled");
        }
        self.plan = None;
        self.parked = None;
        self.timer = Timer::Idle;
    }

    pub fn is_active(&self) -> bool {
        self.parked.is_some() || self.plan.as_ref().is_some_and(|p| p.len() > 0)
    }

    /// Advance the stagger clock and collect the events that came due
    pub fn advance(&mut self, dt: f32) -> Vec<LaunchEvent> {
        let mut events = Vec::new();
        let Some(plan) = self.plan.as_mut() else {
            return events;
        };

        self.timer.advance(dt);
        if self.timer != Timer::Fired {
            return events;
        }

        if let Some(parked) = self.parked.take() {
            events.push(LaunchEvent::Release {
                index: parked.index,
                impulse: plan.vector.impulse(),
            });
        }

        match plan.next() {
            Some(next) => {
                events.push(LaunchEvent::Spawn { index: next.index });
                self.parked = Some(next);
                self.timer.arm(self.interval);
            }
            None => {
                self.plan = None;
                self.timer = Timer::Idle;
            }
        }
        events
    }
}
