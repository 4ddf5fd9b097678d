//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Within one tick
//! the order is fixed: input, ball physics and collisions, watchdog sampling,
//! staggered launches, then the round-complete check.

use super::launch::DragGesture;
use super::level::LevelEngine;
use super::physics::step;
use super::state::{GamePhase, LossCause};
use super::surface::SurfaceTag;
use crate::consts::ESCAPE_MARGIN;
use crate::error::{Result, SimError};
use crate::is_finite_vec;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Current drag gesture in world coordinates
    pub drag: Option<DragGesture>,
    /// Release the drag and fire (ignored without a drag)
    pub confirm_launch: bool,
    /// Target paddle centre
    pub paddle_x: Option<f32>,
}

/// Reject timesteps the simulation clock cannot use
pub fn validate_dt(dt: f32) -> Result<f32> {
    if dt.is_finite() && dt >= 0.0 {
        Ok(dt)
    } else {
        Err(SimError::TimingDrift(dt))
    }
}

/// Advance the game by one fixed timestep
pub fn tick(engine: &mut LevelEngine, input: &TickInput, dt: f32) -> Result<()> {
    // Only a reset leaves a halted round
    if engine.state.phase == GamePhase::Halted {
        return Ok(());
    }

    let dt = validate_dt(dt).unwrap_or_else(|err| {
        log::warn!("{err}, tick treated as zero length");
        0.0
    });

    if let Some(x) = input.paddle_x {
        engine.set_paddle_x(x);
    }

    // Frozen until the host grants a continue or resets
    if engine.state.phase == GamePhase::GameOver {
        return Ok(());
    }

    if input.confirm_launch
        && let Some(drag) = input.drag
        && engine.state.phase == GamePhase::AwaitingLaunch
    {
        let vector = engine.launch_vector(&drag);
        if let Err(err) = engine.confirm_launch(vector) {
            log::warn!("Launch ignored: {err}");
        }
    }

    engine.state.time_secs += dt;

    if engine.state.phase == GamePhase::RoundInFlight {
        // (1) + (2): physics and collision response
        step_balls(engine, dt);

        // (3): watchdog, once a staggered ball has left the queue
        let active = engine.state.has_launched
            && engine.state.balls_remaining_to_launch < engine.state.initial_ball_count;
        let now = engine.state.time_secs;
        let stuck = engine
            .watchdog
            .update(dt, now, active, &engine.state.balls);
        for ball_id in stuck {
            engine.lose_ball(ball_id, LossCause::Stuck);
        }

        // (4): staggered launches
        for event in engine.scheduler.advance(dt) {
            engine.apply_launch_event(event);
        }

        // (5): round complete
        if engine.state.balls.is_empty() {
            engine.complete_round();
        }
    }

    // Ensure deterministic ordering
    engine.state.normalize_order();
    engine.check_invariants()?;
    Ok(())
}

/// Integrate every simulated ball and resolve what it touched.
///
/// Solid bounces add `bounce_force` along the surface normal on top of the
/// reflection; sensors never boost.
fn step_balls(engine: &mut LevelEngine, dt: f32) {
    let gravity = engine.tuning.physics.gravity;
    let bounce_force = engine.tuning.physics.bounce_force;
    let arena = engine.tuning.arena.clone();

    let ids: Vec<u32> = engine
        .state
        .balls
        .iter()
        .filter(|b| b.is_simulated())
        .map(|b| b.id)
        .collect();

    let mut surfaces = engine.surfaces();
    for ball_id in ids {
        let Some(ball) = engine.state.balls.iter_mut().find(|b| b.id == ball_id) else {
            continue;
        };

        let result = step(ball.pos, ball.vel, gravity, dt, &surfaces);
        ball.pos = result.pos;
        ball.vel = result.vel;
        // Live balls get kicked off every solid surface; the aim preview does not
        if let Some(hit) = result.hit
            && result.bounced()
        {
            ball.vel += hit.normal * bounce_force;
        }
        let pos = ball.pos;
        let finite = is_finite_vec(ball.pos) && is_finite_vec(ball.vel);

        if !finite {
            log::error!(
                "{}",
                SimError::InvariantViolation(format!("ball {ball_id} left the number line"))
            );
            engine.lose_ball(ball_id, LossCause::Invalid);
            continue;
        }

        match result.hit.map(|hit| hit.tag) {
            Some(SurfaceTag::Block(block_id)) => {
                engine.damage_block(block_id);
                // Destroyed blocks must not stop later balls this tick
                surfaces = engine.surfaces();
            }
            Some(SurfaceTag::LossLine) => {
                engine.lose_ball(ball_id, LossCause::LossLine);
                continue;
            }
            _ => {}
        }

        if pos.y < arena.loss_line_y {
            engine.lose_ball(ball_id, LossCause::LossLine);
        } else if pos.x.abs() > arena.half_width + ESCAPE_MARGIN
            || pos.y > arena.top_y + ESCAPE_MARGIN
        {
            engine.lose_ball(ball_id, LossCause::Escaped);
        }
    }
}
