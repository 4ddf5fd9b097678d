//! Ball Cascade entry point
//!
//! Headless runner: plays rounds with a random aimer at a fixed frame rate and
//! prints the final state. Usage: `ball-cascade [seed] [rounds] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::Path;

    use ball_cascade::Tuning;
    use ball_cascade::consts::{MAX_SUBSTEPS, SIM_DT};
    use ball_cascade::sim::{DragGesture, GameEvent, GamePhase, LevelEngine, TickInput};
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Bail out of a round that never settles
    const MAX_FRAMES_PER_ROUND: u32 = 60 * 120;

    /// Game instance holding all state
    struct Game {
        engine: LevelEngine,
        aimer: Pcg32,
        accumulator: f32,
        input: TickInput,
        continues_left: u32,
        rounds: u32,
        balls_lost: u32,
        blocks_destroyed: u32,
    }

    impl Game {
        fn new(tuning: Tuning, seed: u64) -> Self {
            Self {
                engine: LevelEngine::new(tuning, seed),
                aimer: Pcg32::seed_from_u64(seed ^ 0x5eed),
                accumulator: 0.0,
                input: TickInput::default(),
                continues_left: 1,
                rounds: 0,
                balls_lost: 0,
                blocks_destroyed: 0,
            }
        }

        /// Random upward slingshot pull from the spawn point
        fn aim(&mut self) -> DragGesture {
            let angle = self.aimer.random_range(0.2..std::f32::consts::PI - 0.2);
            let length = self.aimer.random_range(0.5..1.5);
            DragGesture {
                start: Vec2::ZERO,
                end: -Vec2::from_angle(angle) * length,
            }
        }

        /// Run simulation ticks for one frame
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                if let Err(err) = self.engine.tick(&input, SIM_DT) {
                    log::error!("Tick failed: {err}");
                }
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.confirm_launch = false;
                self.input.drag = None;
            }

            for event in self.engine.drain_events() {
                match event {
                    GameEvent::RoundComplete { .. } => self.rounds += 1,
                    GameEvent::BallLost { .. } => self.balls_lost += 1,
                    GameEvent::BlockDestroyed { .. } => self.blocks_destroyed += 1,
                    _ => {}
                }
            }
        }

        /// Play until `rounds` rounds are complete
        fn play(&mut self, rounds: u32) {
            while self.rounds < rounds {
                match self.engine.phase() {
                    GamePhase::AwaitingLaunch => {
                        let drag = self.aim();
                        if let Some(path) = self.engine.preview(&drag) {
                            log::debug!("Aim preview: {} points", path.len());
                        }
                        self.input.drag = Some(drag);
                        self.input.confirm_launch = true;
                    }
                    GamePhase::GameOver if self.continues_left > 0 => {
                        self.continues_left -= 1;
                        if let Err(err) = self.engine.on_continue_granted() {
                            log::warn!("Continue failed: {err}");
                        }
                    }
                    GamePhase::GameOver => {
                        log::info!("Out of continues at level {}", self.engine.hud().level);
                        return;
                    }
                    GamePhase::Halted => {
                        log::error!("Simulation halted, resetting run");
                        self.engine.reset();
                    }
                    GamePhase::RoundInFlight => {}
                }

                let start = self.rounds;
                let mut frames = 0;
                self.update(FRAME_DT);
                while self.engine.phase() == GamePhase::RoundInFlight
                    && self.rounds == start
                    && frames < MAX_FRAMES_PER_ROUND
                {
                    self.update(FRAME_DT);
                    frames += 1;
                }
                if frames >= MAX_FRAMES_PER_ROUND {
                    log::warn!("Round did not settle after {frames} frames, stopping");
                    return;
                }
            }
        }
    }

    pub fn run() {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let seed = args.first().and_then(|s| s.parse().ok()).unwrap_or(42);
        let rounds = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(20);
        let tuning = match args.get(2) {
            Some(path) => Tuning::load_or_default(Path::new(path)),
            None => Tuning::default(),
        };

        log::info!("Ball Cascade (headless) starting, seed {seed}, {rounds} rounds");
        let mut game = Game::new(tuning, seed);
        game.play(rounds);

        log::info!(
            "Finished: {} rounds, {} balls lost, {} blocks destroyed",
            game.rounds,
            game.balls_lost,
            game.blocks_destroyed
        );
        match serde_json::to_string_pretty(game.engine.state()) {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("Could not serialize final state: {err}"),
        }
        let hud = game.engine.hud();
        println!("Level {} | Balls {}", hud.level, hud.balls_remaining);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The core is embedded by a host on the web; there is no standalone runner
}
