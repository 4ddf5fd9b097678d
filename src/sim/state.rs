//! Game state and core simulation types
//!
//! Everything the host needs to draw a frame or snapshot a run lives in
//! [`LevelState`]. Only the level engine mutates it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::BlockTuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Head ball queued at the spawn point, waiting for the player to aim
    AwaitingLaunch,
    /// Balls are flying or waiting for their staggered release
    RoundInFlight,
    /// A block reached the loss line; only continue or reset leave this phase
    GameOver,
    /// State corruption was detected; only reset leaves this phase
    Halted,
}

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Off while the ball waits for its staggered release
    pub collisions_enabled: bool,
    /// On while the ball sits at the spawn point before its impulse
    pub launch_pending: bool,
    /// Index in the staggered volley; `None` for the head ball
    #[serde(default)]
    pub launch_slot: Option<u32>,
}

impl Ball {
    /// A queued head ball
    pub fn new(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            collisions_enabled: true,
            launch_pending: true,
            launch_slot: None,
        }
    }

    /// A staggered ball parked until its release
    pub fn parked(id: u32, pos: Vec2, slot: u32) -> Self {
        Self {
            collisions_enabled: false,
            launch_slot: Some(slot),
            ..Self::new(id, pos)
        }
    }

    /// Apply the launch impulse (unit mass, so impulse becomes velocity)
    pub fn launch(&mut self, impulse: Vec2) {
        self.vel = impulse;
        self.launch_pending = false;
    }

    /// Integrated and collided this tick
    #[inline]
    pub fn is_simulated(&self) -> bool {
        self.collisions_enabled && !self.launch_pending
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// A destructible block on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: u32,
    /// Rows descended since spawning (0 = spawn row)
    pub row: u32,
    pub col: u32,
    pub health: u32,
    pub is_double_health: bool,
}

impl Block {
    /// World-space centre
    pub fn center(&self, layout: &BlockTuning) -> Vec2 {
        let total_width = (layout.blocks_per_row.saturating_sub(1)) as f32 * layout.spacing_x;
        Vec2::new(
            -total_width / 2.0 + self.col as f32 * layout.spacing_x,
            layout.spawn_y - self.row as f32 * layout.spacing_y,
        )
    }

    /// Health as shown on the block face
    pub fn health_label(&self) -> String {
        self.health.to_string()
    }

    /// Remove one point of health; returns true when the block is destroyed
    pub fn hit(&mut self) -> bool {
        self.health = self.health.saturating_sub(1);
        self.health == 0
    }
}

/// Why a ball left play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossCause {
    /// Touched the bottom trigger
    LossLine,
    /// Left the arena bounds without touching a trigger
    Escaped,
    /// Evicted by the stuck-ball watchdog
    Stuck,
    /// Position or velocity stopped being finite
    Invalid,
}

/// Events for the audio and presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BallLaunched { ball_id: u32, impulse: Vec2 },
    BallSpawned { ball_id: u32 },
    BallReleased { ball_id: u32 },
    BlockHit { block_id: u32, health: u32 },
    BlockDestroyed { block_id: u32 },
    BallLost { ball_id: u32, cause: LossCause },
    RoundComplete { level: u32 },
    RowSpawned { level: u32, blocks: u32 },
    GameOver { level: u32 },
    Continued { removed_blocks: u32 },
    Reset,
}

/// Counters shown on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    pub level: u32,
    pub balls_remaining: u32,
}

/// Complete level state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelState {
    pub current_level: u32,
    /// Extra balls fired behind the head ball each round
    pub initial_ball_count: u32,
    /// Extra balls not yet dispatched this round
    pub balls_remaining_to_launch: u32,
    /// Live balls including the queued head ball (sorted by id)
    pub balls: Vec<Ball>,
    /// Live blocks (sorted by id)
    pub blocks: Vec<Block>,
    pub phase: GamePhase,
    pub is_game_over: bool,
    /// Set by the first launch of the run; gates the watchdog
    pub has_launched: bool,
    /// Paddle centre x
    pub paddle_x: f32,
    /// Simulation clock in seconds
    pub time_secs: f32,
    /// Next entity ID
    next_id: u32,
}

impl LevelState {
    /// Empty level 1 with nothing spawned yet
    pub fn new() -> Self {
        Self {
            current_level: 1,
            initial_ball_count: 0,
            balls_remaining_to_launch: 0,
            balls: Vec::new(),
            blocks: Vec::new(),
            phase: GamePhase::AwaitingLaunch,
            is_game_over: false,
            has_launched: false,
            paddle_x: 0.0,
            time_secs: 0.0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The ball waiting for the player's aim, if any
    pub fn head_ball(&self) -> Option<&Ball> {
        self.balls
            .iter()
            .find(|b| b.launch_slot.is_none() && b.launch_pending)
    }

    pub fn ball(&self, id: u32) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn block(&self, id: u32) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn hud(&self) -> Hud {
        Hud {
            level: self.current_level,
            balls_remaining: self.balls_remaining_to_launch,
        }
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
        self.blocks.sort_by_key(|b| b.id);
    }
}

impl Default for LevelState {
    fn default() -> Self {
        Self::new()
    }
}
