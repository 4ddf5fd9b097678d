//! Level progression
//!
//! [`LevelEngine`] owns the [`LevelState`] together with the launch scheduler,
//! the watchdog and the seeded RNG. Rounds end when the last ball is lost;
//! every completed round grants one more ball, pushes the board down a row and
//! spawns a fresh row on top.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::launch::{DragGesture, LaunchEvent, LaunchScheduler, LaunchVector};
use super::state::{Ball, Block, GameEvent, GamePhase, Hud, LevelState, LossCause};
use super::surface::{Surface, SurfaceTag, arena_surfaces, box_surfaces, clamp_paddle_x};
use super::tick::{TickInput, tick};
use super::trajectory::{PredictionParams, TrajectoryPoint, predict};
use super::watchdog::StuckBallWatchdog;
use crate::clamp_probability;
use crate::consts::MAX_BUFFERED_EVENTS;
use crate::error::{Result, SimError};
use crate::tuning::{BlockTuning, Tuning};

/// Per-slot spawn probability for a level.
///
/// Escalates in steps every 10 levels and is clamped to [0, 1].
pub fn spawn_chance(level: u32, blocks: &BlockTuning) -> f32 {
    let steps = (level / 10) as f32;
    clamp_probability(blocks.initial_spawn_chance + steps * blocks.spawn_chance_increment)
}

/// Probability that a new block gets double health
pub fn double_health_chance(level: u32, blocks: &BlockTuning) -> f32 {
    let chance = if level < blocks.double_health_level {
        blocks.double_health_chance_low
    } else {
        blocks.double_health_chance_high
    };
    clamp_probability(chance)
}

/// Owner of all mutable simulation state
#[derive(Debug, Clone)]
pub struct LevelEngine {
    pub(super) state: LevelState,
    pub(super) tuning: Tuning,
    pub(super) scheduler: LaunchScheduler,
    pub(super) watchdog: StuckBallWatchdog,
    /// Undrained events, oldest first; capped at `MAX_BUFFERED_EVENTS`
    events: VecDeque<GameEvent>,
    dropped_events: u32,
    rng: Pcg32,
    seed: u64,
}

impl LevelEngine {
    /// Start a run: level 1, one queued ball, one row of blocks
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let tuning = tuning.sanitized();
        let mut engine = Self {
            state: LevelState::new(),
            scheduler: LaunchScheduler::new(),
            watchdog: StuckBallWatchdog::new(tuning.watchdog.clone()),
            events: VecDeque::new(),
            dropped_events: 0,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            tuning,
        };
        engine.spawn_head_ball();
        engine.spawn_row();
        log::info!("Run started (seed {seed})");
        engine
    }

    pub fn state(&self) -> &LevelState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn hud(&self) -> Hud {
        self.state.hud()
    }

    /// Take all events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        if self.dropped_events > 0 {
            log::warn!("{} events dropped before this drain", self.dropped_events);
            self.dropped_events = 0;
        }
        self.events.drain(..).collect()
    }

    /// Buffer an event for the host, dropping the oldest once the buffer is full
    fn emit(&mut self, event: GameEvent) {
        if self.events.len() >= MAX_BUFFERED_EVENTS {
            self.events.pop_front();
            self.dropped_events += 1;
        }
        self.events.push_back(event);
    }

    /// Advance one fixed timestep.
    ///
    /// Events accumulate until [`drain_events`](Self::drain_events) is called,
    /// so hosts drain once per frame. Past `MAX_BUFFERED_EVENTS` the oldest are
    /// discarded.
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> Result<()> {
        tick(self, input, dt)
    }

    /// Clamped launch vector for a drag gesture
    pub fn launch_vector(&self, drag: &DragGesture) -> LaunchVector {
        LaunchVector::from_drag(drag.start, drag.end, &self.tuning.launch)
    }

    /// True while the head ball is queued and can be aimed
    pub fn can_launch(&self) -> bool {
        self.state.phase == GamePhase::AwaitingLaunch
            && self.state.head_ball().is_some()
            && self.state.balls_remaining_to_launch == self.state.initial_ball_count
    }

    /// Aim preview from the head ball; `None` once launching is no longer possible
    pub fn preview(&self, drag: &DragGesture) -> Option<Vec<TrajectoryPoint>> {
        if !self.can_launch() {
            return None;
        }
        let head = self.state.head_ball()?;
        let vector = self.launch_vector(drag);
        Some(predict(
            head.pos,
            vector.impulse(),
            &PredictionParams::from_tuning(&self.tuning),
            &self.surfaces(),
        ))
    }

    /// Every collider currently in the arena
    pub fn surfaces(&self) -> Vec<Surface> {
        let radius = self.tuning.physics.ball_radius;
        let mut surfaces = arena_surfaces(&self.tuning.arena, radius, self.state.paddle_x);
        let half = glam::Vec2::splat(self.tuning.blocks.size / 2.0 + radius);
        for block in &self.state.blocks {
            surfaces.extend(box_surfaces(
                block.center(&self.tuning.blocks),
                half,
                SurfaceTag::Block(block.id),
            ));
        }
        surfaces
    }

    /// Move the paddle, keeping it inside the arena
    pub fn set_paddle_x(&mut self, x: f32) {
        self.state.paddle_x = clamp_paddle_x(&self.tuning.arena, x);
    }

    /// Fire the head ball and start the staggered volley
    pub fn confirm_launch(&mut self, vector: LaunchVector) -> Result<()> {
        if self.state.phase != GamePhase::AwaitingLaunch {
            return Err(SimError::PhaseMismatch {
                expected: GamePhase::AwaitingLaunch,
                actual: self.state.phase,
            });
        }
        if !self.can_launch() {
            let err = SimError::InvariantViolation("no queued ball to launch".into());
            log::error!("{err}");
            return Err(err);
        }

        let vector = LaunchVector::new(
            vector.direction,
            vector.magnitude,
            self.tuning.launch.max_launch_force,
        );
        let impulse = vector.impulse();
        let Some(head) = self
            .state
            .balls
            .iter_mut()
            .find(|b| b.launch_slot.is_none() && b.launch_pending)
        else {
            return Err(SimError::InvariantViolation("no queued ball to launch".into()));
        };
        head.launch(impulse);
        let ball_id = head.id;

        self.state.has_launched = true;
        self.state.phase = GamePhase::RoundInFlight;
        self.scheduler.start(
            vector,
            self.state.initial_ball_count,
            self.tuning.launch.stagger_interval,
        );
        self.emit(GameEvent::BallLaunched { ball_id, impulse });
        log::debug!(
            "Level {}: launched ball {} with impulse ({:.2}, {:.2})",
            self.state.current_level,
            ball_id,
            impulse.x,
            impulse.y
        );
        Ok(())
    }

    /// Apply one scheduler event to the ball arena
    pub(super) fn apply_launch_event(&mut self, event: LaunchEvent) {
        match event {
            LaunchEvent::Spawn { index } => {
                let id = self.state.next_entity_id();
                let spawn = self.tuning.arena.spawn_point;
                self.state.balls.push(Ball::parked(id, spawn, index));
                self.state.balls_remaining_to_launch =
                    self.state.balls_remaining_to_launch.saturating_sub(1);
                self.emit(GameEvent::BallSpawned { ball_id: id });
            }
            LaunchEvent::Release { index, impulse } => {
                let Some(ball) = self
                    .state
                    .balls
                    .iter_mut()
                    .find(|b| b.launch_slot == Some(index) && b.launch_pending)
                else {
                    log::debug!("Release for slot {index} ignored, ball is gone");
                    return;
                };
                ball.launch(impulse);
                // A zero impulse leaves the ball parked for the watchdog to collect
                if impulse != glam::Vec2::ZERO {
                    ball.collisions_enabled = true;
                }
                let ball_id = ball.id;
                self.emit(GameEvent::BallReleased { ball_id });
            }
        }
    }

    /// One ball-block collision
    pub(super) fn damage_block(&mut self, block_id: u32) {
        let Some(index) = self.state.blocks.iter().position(|b| b.id == block_id) else {
            return;
        };
        if self.state.blocks[index].hit() {
            self.state.blocks.remove(index);
            self.emit(GameEvent::BlockDestroyed { block_id });
        } else {
            let health = self.state.blocks[index].health;
            self.emit(GameEvent::BlockHit { block_id, health });
        }
    }

    /// Remove a ball from play
    pub(super) fn lose_ball(&mut self, ball_id: u32, cause: LossCause) {
        let before = self.state.balls.len();
        self.state.balls.retain(|b| b.id != ball_id);
        if self.state.balls.len() < before {
            log::debug!("Ball {ball_id} lost ({cause:?})");
            self.emit(GameEvent::BallLost { ball_id, cause });
        }
    }

    /// Close the round: advance the level, descend the board, refill.
    pub(super) fn complete_round(&mut self) {
        self.scheduler.cancel();
        self.watchdog.cancel();

        let finished = self.state.current_level;
        self.emit(GameEvent::RoundComplete { level: finished });

        self.state.current_level += 1;
        self.state.initial_ball_count += 1;
        self.state.balls_remaining_to_launch = self.state.initial_ball_count;
        log::info!(
            "Level {} cleared, now level {} with {} extra balls",
            finished,
            self.state.current_level,
            self.state.initial_ball_count
        );

        if self.move_blocks_down() {
            self.state.phase = GamePhase::GameOver;
            self.state.is_game_over = true;
            self.emit(GameEvent::GameOver {
                level: self.state.current_level,
            });
            log::info!("Game over at level {}", self.state.current_level);
        } else {
            self.spawn_head_ball();
            self.state.phase = GamePhase::AwaitingLaunch;
        }
        // The new row appears even on game over; continue-recovery keeps it
        self.spawn_row();
    }

    /// Reward granted by the host after a game over: clear the bottom rows and carry on
    pub fn on_continue_granted(&mut self) -> Result<()> {
        if self.state.phase != GamePhase::GameOver {
            log::warn!("Continue granted outside game over, ignoring");
            return Err(SimError::PhaseMismatch {
                expected: GamePhase::GameOver,
                actual: self.state.phase,
            });
        }
        self.scheduler.cancel();
        self.watchdog.cancel();

        let threshold = self.tuning.arena.continue_clear_y;
        let layout = &self.tuning.blocks;
        let before = self.state.blocks.len();
        self.state
            .blocks
            .retain(|b| b.center(layout).y > threshold);
        let removed_blocks = (before - self.state.blocks.len()) as u32;

        self.state.is_game_over = false;
        if self.state.head_ball().is_none() {
            self.spawn_head_ball();
        }
        self.state.phase = GamePhase::AwaitingLaunch;
        self.emit(GameEvent::Continued { removed_blocks });
        log::info!(
            "Continuing at level {} ({} bottom blocks removed)",
            self.state.current_level,
            removed_blocks
        );
        Ok(())
    }

    /// Start over from level 1, discarding all pending work
    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.watchdog.cancel();
        self.state = LevelState::new();
        self.spawn_row();
        self.spawn_head_ball();
        self.emit(GameEvent::Reset);
        log::info!("Run reset");
    }

    /// Queue a ball at the spawn point for the player to aim
    fn spawn_head_ball(&mut self) {
        let id = self.state.next_entity_id();
        self.state
            .balls
            .push(Ball::new(id, self.tuning.arena.spawn_point));
    }

    /// Shift every block one row down; true if any reached the loss threshold
    fn move_blocks_down(&mut self) -> bool {
        let layout = &self.tuning.blocks;
        let limit = self.tuning.arena.game_over_y;
        let mut crossed = false;
        for block in &mut self.state.blocks {
            block.row += 1;
            if block.center(layout).y <= limit {
                crossed = true;
            }
        }
        crossed
    }

    /// Spawn a new top row; returns the number of blocks created
    fn spawn_row(&mut self) -> u32 {
        let level = self.state.current_level;
        let per_row = self.tuning.blocks.blocks_per_row;
        let chance = spawn_chance(level, &self.tuning.blocks);

        let mut cols: Vec<u32> = (0..per_row)
            .filter(|_| self.rng.random::<f32>() < chance)
            .collect();
        if cols.is_empty() {
            cols.push(self.rng.random_range(0..per_row));
        }

        let double_chance = double_health_chance(level, &self.tuning.blocks);
        for &col in &cols {
            let is_double_health = self.rng.random::<f32>() < double_chance;
            let health = if is_double_health { level * 2 } else { level };
            let id = self.state.next_entity_id();
            self.state.blocks.push(Block {
                id,
                row: 0,
                col,
                health,
                is_double_health,
            });
        }

        let blocks = cols.len() as u32;
        self.emit(GameEvent::RowSpawned { level, blocks });
        log::debug!("Level {level}: spawned {blocks} blocks (chance {chance:.2})");
        blocks
    }

    /// Repair what can be repaired; halt on corruption.
    ///
    /// Returns the violations that were fixed.
    pub(super) fn check_invariants(&mut self) -> Result<Vec<SimError>> {
        let mut repaired = Vec::new();
        let s = &mut self.state;

        if s.balls_remaining_to_launch > s.initial_ball_count {
            repaired.push(SimError::InvariantViolation(format!(
                "{} balls remaining exceeds {} per round",
                s.balls_remaining_to_launch, s.initial_ball_count
            )));
            s.balls_remaining_to_launch = s.initial_ball_count;
        }

        let before = s.blocks.len();
        s.blocks.retain(|b| b.health > 0);
        if s.blocks.len() < before {
            repaired.push(SimError::InvariantViolation(format!(
                "{} zero-health blocks left on the board",
                before - s.blocks.len()
            )));
        }

        for err in &repaired {
            log::error!("{err}");
        }

        let ids_unique = |mut ids: Vec<u32>| {
            ids.sort_unstable();
            ids.windows(2).all(|w| w[0] != w[1])
        };
        let ball_ids: Vec<u32> = s.balls.iter().map(|b| b.id).collect();
        let block_ids: Vec<u32> = s.blocks.iter().map(|b| b.id).collect();
        if !ids_unique(ball_ids) || !ids_unique(block_ids) {
            s.phase = GamePhase::Halted;
            self.scheduler.cancel();
            self.watchdog.cancel();
            let err = SimError::CorruptState("duplicate entity ids".into());
            log::error!("{err}, round halted");
            return Err(err);
        }

        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(seed: u64) -> LevelEngine {
        LevelEngine::new(Tuning::default(), seed)
    }

    fn single_slot_tuning() -> Tuning {
        let mut t = Tuning::default();
        t.blocks.initial_spawn_chance = 0.0;
        t.blocks.spawn_chance_increment = 0.0;
        t
    }

    fn drop_all_balls(e: &mut LevelEngine) {
        let ids: Vec<u32> = e.state.balls.iter().map(|b| b.id).collect();
        for id in ids {
            e.lose_ball(id, LossCause::LossLine);
        }
    }

    #[test]
    fn test_new_run() {
        let e = engine(1);
        let s = e.state();
        assert_eq!(s.current_level, 1);
        assert_eq!(s.initial_ball_count, 0);
        assert_eq!(s.balls_remaining_to_launch, 0);
        assert_eq!(s.balls.len(), 1);
        assert!(s.head_ball().is_some());
        assert!(!s.blocks.is_empty());
        assert!(s.blocks.iter().all(|b| b.row == 0 && b.health >= 1));
        assert_eq!(e.phase(), GamePhase::AwaitingLaunch);
    }

    #[test]
    fn test_spawn_chance_steps_every_ten_levels() {
        let b = BlockTuning::default();
        assert!((spawn_chance(1, &b) - 0.2).abs() < 1e-6);
        assert!((spawn_chance(9, &b) - 0.2).abs() < 1e-6);
        assert!((spawn_chance(10, &b) - 0.25).abs() < 1e-6);
        assert!((spawn_chance(19, &b) - 0.25).abs() < 1e-6);
        assert!((spawn_chance(35, &b) - 0.35).abs() < 1e-6);
        assert_eq!(spawn_chance(500, &b), 1.0);
    }

    #[test]
    fn test_double_health_cliff_at_fifty() {
        let b = BlockTuning::default();
        assert_eq!(double_health_chance(49, &b), 0.01);
        assert_eq!(double_health_chance(50, &b), 0.35);
        assert_eq!(double_health_chance(1, &b), 0.01);
        assert_eq!(double_health_chance(120, &b), 0.35);
    }

    #[test]
    fn test_empty_row_forces_exactly_one_block() {
        let mut e = LevelEngine::new(single_slot_tuning(), 3);
        for _ in 0..50 {
            let before = e.state.blocks.len();
            assert_eq!(e.spawn_row(), 1);
            assert_eq!(e.state.blocks.len(), before + 1);
        }
        assert!(e.state.blocks.iter().all(|b| b.col < 9));
    }

    #[test]
    fn test_certain_spawn_fills_the_row() {
        let mut t = Tuning::default();
        t.blocks.initial_spawn_chance = 1.0;
        let e = LevelEngine::new(t, 9);
        let mut cols: Vec<u32> = e.state.blocks.iter().map(|b| b.col).collect();
        cols.sort_unstable();
        assert_eq!(cols, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_block_health_follows_level() {
        let mut t = Tuning::default();
        t.blocks.double_health_chance_low = 0.0;
        t.blocks.double_health_chance_high = 1.0;
        let mut e = LevelEngine::new(t, 5);
        assert!(e.state.blocks.iter().all(|b| b.health == 1 && !b.is_double_health));

        e.state.blocks.clear();
        e.state.current_level = 49;
        e.spawn_row();
        assert!(e.state.blocks.iter().all(|b| b.health == 49 && !b.is_double_health));

        e.state.blocks.clear();
        e.state.current_level = 50;
        e.spawn_row();
        assert!(e.state.blocks.iter().all(|b| b.health == 100 && b.is_double_health));
    }

    #[test]
    fn test_block_hit_then_destroyed() {
        let mut e = engine(2);
        e.state.blocks.clear();
        e.state.blocks.push(Block {
            id: 500,
            row: 0,
            col: 4,
            health: 2,
            is_double_health: false,
        });
        e.drain_events();

        e.damage_block(500);
        assert_eq!(e.state.block(500).unwrap().health, 1);
        e.damage_block(500);
        assert!(e.state.block(500).is_none());
        assert_eq!(
            e.drain_events(),
            vec![
                GameEvent::BlockHit { block_id: 500, health: 1 },
                GameEvent::BlockDestroyed { block_id: 500 },
            ]
        );
    }

    #[test]
    fn test_round_complete_grants_a_ball() {
        let mut e = engine(4);
        e.confirm_launch(LaunchVector::new(glam::Vec2::NEG_Y, 20.0, 20.0))
            .unwrap();
        assert_eq!(e.phase(), GamePhase::RoundInFlight);
        drop_all_balls(&mut e);
        e.complete_round();

        let s = e.state();
        assert_eq!(s.current_level, 2);
        assert_eq!(s.initial_ball_count, 1);
        assert_eq!(s.balls_remaining_to_launch, 1);
        assert_eq!(s.balls.len(), 1);
        assert!(s.head_ball().is_some());
        assert_eq!(e.phase(), GamePhase::AwaitingLaunch);
        assert!(s.blocks.iter().any(|b| b.row == 1));
        assert!(s.blocks.iter().any(|b| b.row == 0));
    }

    #[test]
    fn test_launch_rejected_outside_awaiting_phase() {
        let mut e = engine(4);
        let v = LaunchVector::new(glam::Vec2::Y, 10.0, 20.0);
        e.confirm_launch(v).unwrap();
        assert!(matches!(
            e.confirm_launch(v),
            Err(SimError::PhaseMismatch { .. })
        ));
    }

    #[test]
    fn test_launch_clamps_oversized_vector() {
        let mut e = engine(4);
        let v = LaunchVector {
            direction: glam::Vec2::Y,
            magnitude: 999.0,
        };
        e.confirm_launch(v).unwrap();
        assert_eq!(e.state.balls[0].vel, glam::Vec2::new(0.0, 20.0));
    }

    fn engine_one_round_from_game_over() -> LevelEngine {
        let mut e = engine(6);
        e.state.blocks.clear();
        // Row 8 sits at y = -4; one more descent reaches the loss threshold
        e.state.blocks.push(Block {
            id: 900,
            row: 8,
            col: 0,
            health: 3,
            is_double_health: false,
        });
        e.state.blocks.push(Block {
            id: 901,
            row: 2,
            col: 5,
            health: 3,
            is_double_health: false,
        });
        e.confirm_launch(LaunchVector::new(glam::Vec2::NEG_Y, 5.0, 20.0))
            .unwrap();
        drop_all_balls(&mut e);
        e.complete_round();
        e
    }

    #[test]
    fn test_descent_past_threshold_is_game_over() {
        let mut e = engine_one_round_from_game_over();
        assert_eq!(e.phase(), GamePhase::GameOver);
        assert!(e.state.is_game_over);
        assert!(e.state.balls.is_empty());
        // New row still spawned on top
        assert!(e.state.blocks.iter().any(|b| b.row == 0));
        assert!(e.drain_events().contains(&GameEvent::GameOver { level: 2 }));
    }

    #[test]
    fn test_continue_removes_only_bottom_blocks() {
        let mut e = engine_one_round_from_game_over();
        let top_row: Vec<u32> = e
            .state
            .blocks
            .iter()
            .filter(|b| b.row == 0)
            .map(|b| b.id)
            .collect();

        e.on_continue_granted().unwrap();

        let s = e.state();
        assert!(s.block(900).is_none());
        assert!(s.block(901).is_some());
        assert!(top_row.iter().all(|id| s.block(*id).is_some()));
        assert_eq!(s.current_level, 2);
        assert_eq!(s.initial_ball_count, 1);
        assert!(!s.is_game_over);
        assert_eq!(s.balls.len(), 1);
        assert_eq!(e.phase(), GamePhase::AwaitingLaunch);
        assert!(e.can_launch());
    }

    #[test]
    fn test_continue_outside_game_over_is_rejected() {
        let mut e = engine(7);
        assert_eq!(
            e.on_continue_granted(),
            Err(SimError::PhaseMismatch {
                expected: GamePhase::GameOver,
                actual: GamePhase::AwaitingLaunch,
            })
        );
    }

    #[test]
    fn test_full_reset() {
        let mut e = engine_one_round_from_game_over();
        e.reset();
        let s = e.state();
        assert_eq!(s.current_level, 1);
        assert_eq!(s.initial_ball_count, 0);
        assert_eq!(s.balls_remaining_to_launch, 0);
        assert_eq!(s.balls.len(), 1);
        assert!(s.head_ball().is_some());
        assert!(!s.blocks.is_empty());
        assert!(s.blocks.iter().all(|b| b.row == 0));
        assert!(!s.is_game_over);
        assert_eq!(e.phase(), GamePhase::AwaitingLaunch);
    }

    #[test]
    fn test_release_for_missing_ball_is_ignored() {
        let mut e = engine(8);
        e.apply_launch_event(LaunchEvent::Release {
            index: 3,
            impulse: glam::Vec2::Y,
        });
        assert_eq!(e.state.balls.len(), 1);
    }

    #[test]
    fn test_zero_impulse_release_stays_parked() {
        let mut e = engine(8);
        e.state.initial_ball_count = 1;
        e.state.balls_remaining_to_launch = 1;
        e.apply_launch_event(LaunchEvent::Spawn { index: 0 });
        assert_eq!(e.state.balls_remaining_to_launch, 0);
        e.apply_launch_event(LaunchEvent::Release {
            index: 0,
            impulse: glam::Vec2::ZERO,
        });
        let parked = e.state.balls.iter().find(|b| b.launch_slot == Some(0)).unwrap();
        assert!(!parked.launch_pending);
        assert!(!parked.is_simulated());
    }

    #[test]
    fn test_preview_only_before_launch() {
        let mut e = engine(10);
        let drag = DragGesture {
            start: glam::Vec2::ZERO,
            end: glam::Vec2::new(0.3, -1.0),
        };
        let points = e.preview(&drag).unwrap();
        assert_eq!(points.len(), e.tuning.physics.prediction_steps);
        assert_eq!(points[0].pos, e.tuning.arena.spawn_point);

        let v = e.launch_vector(&drag);
        e.confirm_launch(v).unwrap();
        assert!(e.preview(&drag).is_none());
    }

    #[test]
    fn test_invariant_repairs() {
        let mut e = engine(11);
        e.state.balls_remaining_to_launch = 4;
        e.state.blocks[0].health = 0;
        let repaired = e.check_invariants().unwrap();
        assert_eq!(repaired.len(), 2);
        assert_eq!(e.state.balls_remaining_to_launch, 0);
        assert!(e.state.blocks.iter().all(|b| b.health > 0));
    }

    #[test]
    fn test_duplicate_ids_halt_the_round() {
        let mut e = engine(12);
        let dup = e.state.balls[0].clone();
        e.state.balls.push(dup);
        assert!(matches!(
            e.check_invariants(),
            Err(SimError::CorruptState(_))
        ));
        assert_eq!(e.phase(), GamePhase::Halted);
    }

    #[test]
    fn test_undrained_events_are_capped() {
        let mut e = engine(14);
        e.drain_events();
        for block_id in 0..(MAX_BUFFERED_EVENTS as u32 + 10) {
            e.emit(GameEvent::BlockDestroyed { block_id });
        }
        let events = e.drain_events();
        assert_eq!(events.len(), MAX_BUFFERED_EVENTS);
        // Oldest dropped, newest kept
        assert_eq!(events[0], GameEvent::BlockDestroyed { block_id: 10 });
        assert_eq!(
            events.last(),
            Some(&GameEvent::BlockDestroyed {
                block_id: MAX_BUFFERED_EVENTS as u32 + 9
            })
        );
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn test_paddle_is_clamped() {
        let mut e = engine(13);
        e.set_paddle_x(50.0);
        assert_eq!(e.state.paddle_x, 1.5);
    }
}
