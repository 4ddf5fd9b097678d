//! Stuck-ball watchdog
//!
//! Samples ball speeds on a fixed interval of simulation time. A ball that
//! stays slower than the threshold for longer than the timeout is reported;
//! the engine decides what to do with it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::launch::Timer;
use super::state::Ball;
use crate::tuning::WatchdogTuning;

/// Per-ball monitoring state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum StuckState {
    /// Moving, or never sampled
    #[default]
    Unmonitored,
    /// Slow since this simulation time
    Timing { since: f32 },
    /// Reported once; stays here until the ball leaves play
    DeclaredStuck,
}

/// Periodic speed sampler
#[derive(Debug, Clone)]
pub struct StuckBallWatchdog {
    tuning: WatchdogTuning,
    sample_timer: Timer,
    /// Keyed by ball id; BTreeMap keeps reports in id order. Absent ids are
    /// `Unmonitored`.
    timers: BTreeMap<u32, StuckState>,
}

impl StuckBallWatchdog {
    pub fn new(tuning: WatchdogTuning) -> Self {
        Self {
            sample_timer: Timer::Idle,
            timers: BTreeMap::new(),
            tuning,
        }
    }

    /// Forget every timer and stop sampling until the gate reopens
    pub fn cancel(&mut self) {
        self.timers.clear();
        self.sample_timer = Timer::Idle;
    }

    /// Current state of one ball
    pub fn state_of(&self, ball_id: u32) -> StuckState {
        self.timers.get(&ball_id).copied().unwrap_or_default()
    }

    /// Advance the sampling clock.
    ///
    /// `now` is the simulation time after this tick. While `active` is false
    /// nothing is sampled and the clock re-arms, so the first sample comes a
    /// full interval after activation. Returns the ids newly declared stuck;
    /// each ball is reported at most once.
    pub fn update(&mut self, dt: f32, now: f32, active: bool, balls: &[Ball]) -> Vec<u32> {
        if !active {
            self.sample_timer = Timer::Idle;
            return Vec::new();
        }
        if self.sample_timer == Timer::Idle {
            self.sample_timer.arm(self.tuning.check_interval);
            return Vec::new();
        }
        if !self.sample_timer.advance(dt) {
            return Vec::new();
        }
        self.sample_timer.arm(self.tuning.check_interval);
        self.sample(now, balls)
    }

    /// Take one speed sample of every ball
    pub fn sample(&mut self, now: f32, balls: &[Ball]) -> Vec<u32> {
        self.timers
            .retain(|id, _| balls.iter().any(|b| b.id == *id));

        let mut stuck = Vec::new();
        for ball in balls {
            let state = self.state_of(ball.id);
            if state == StuckState::DeclaredStuck {
                continue;
            }
            if ball.speed() >= self.tuning.min_speed {
                self.timers.remove(&ball.id);
                continue;
            }
            match state {
                StuckState::Unmonitored => {
                    self.timers.insert(ball.id, StuckState::Timing { since: now });
                }
                StuckState::Timing { since } => {
                    if now - since > self.tuning.stuck_timeout {
                        stuck.push(ball.id);
                    }
                }
                StuckState::DeclaredStuck => {}
            }
        }

        for id in &stuck {
            self.timers.insert(*id, StuckState::DeclaredStuck);
            log::info!("Ball {id} stuck for more than {:.1}s", self.tuning.stuck_timeout);
        }
        stuck.sort_unstable();
        stuck
    }
}
