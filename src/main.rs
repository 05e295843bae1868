//! Pun Toss entry point
//!
//! The browser build is driven from JavaScript through `platform::web`.
//! Natively this runs the demo scene headless with a scripted player and
//! logs every cue.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use pun_toss::consts::SIM_DT;
    use pun_toss::director::LogPresenter;
    use pun_toss::sim::{PhysicsWorld, World};
    use pun_toss::{SceneSpec, Settings, Stage, StageInput, StagePhase};

    /// Scripted pointer driving a stage one fixed step at a time
    struct Player {
        stage: Stage<World>,
        presenter: LogPresenter,
        pointer: Vec2,
    }

    impl Player {
        fn step(&mut self, input: StageInput) {
            self.stage.tick(&input, SIM_DT);
            self.stage.present(&mut self.presenter);
        }

        fn wait(&mut self, secs: f32) {
            let input = StageInput {
                pointer: self.pointer,
                ..Default::default()
            };
            for _ in 0..(secs / SIM_DT).round() as u32 {
                self.step(input);
            }
        }

        fn press(&mut self, at: Vec2) {
            self.pointer = at;
            self.step(StageInput {
                pointer: at,
                press: true,
                ..Default::default()
            });
        }

        fn release(&mut self, at: Vec2) {
            self.pointer = at;
            self.step(StageInput {
                pointer: at,
                release: true,
                ..Default::default()
            });
        }

        /// Move the pointer toward `to` in increments of at most `per_step`
        fn drag_to(&mut self, to: Vec2, per_step: f32) {
            loop {
                let remaining = to - self.pointer;
                let arrived = remaining.length() <= per_step;
                self.pointer = if arrived { to } else { self.pointer + remaining.clamp_length_max(per_step) };
                self.wait(SIM_DT);
                if arrived {
                    break;
                }
            }
        }

        fn position(&self, name: &str) -> Option<Vec2> {
            let id = self.stage.world.find(name)?;
            self.stage.world.body(id).map(|b| b.pos)
        }

        fn throw_futon(&mut self) {
            let Some(at) = self.position("futon") else {
                log::warn!("No futon in scene");
                return;
            };
            self.press(at);
            self.release(at + Vec2::new(1.2, 0.6));
        }

        fn pester_seal(&mut self) {
            let Some(at) = self.position("seal") else {
                log::warn!("No seal in scene");
                return;
            };
            for _ in 0..10 {
                self.press(at);
                self.release(at);
            }
        }

        fn give(&mut self, item: &str, receiver: &str) {
            let (Some(from), Some(to)) = (self.position(item), self.position(receiver)) else {
                log::warn!("Cannot give {item} to {receiver}");
                return;
            };
            self.press(from);
            self.drag_to(to, 0.25);
            self.release(to);
        }

        fn lift_stone(&mut self) {
            let Some(at) = self.position("stone") else {
                log::warn!("No stone in scene");
                return;
            };
            self.press(at);
            self.drag_to(Vec2::new(at.x, 4.0), 0.2);
            self.release(self.pointer);
        }
    }

    pub fn run() {
        pun_toss::platform::init_logging();
        log::info!("Pun Toss (native) starting...");

        let settings = Settings::load();
        let stage = match SceneSpec::demo().and_then(|scene| scene.build(&settings)) {
            Ok(stage) => stage,
            Err(e) => {
                log::error!("Could not load the demo scene: {e}");
                return;
            }
        };
        let mut player = Player {
            stage,
            presenter: LogPresenter,
            pointer: Vec2::ZERO,
        };

        // Let everything settle, then work through the gags with a pause
        // after each so the previous pun has left the screen
        player.wait(1.0);
        player.throw_futon();
        player.wait(3.0);
        player.pester_seal();
        player.wait(3.0);
        player.give("paper", "toilet");
        player.wait(3.0);
        player.give("flower", "principal");
        player.wait(3.0);
        player.lift_stone();
        player.wait(4.0);

        let fired: Vec<&str> = player
            .stage
            .gags()
            .iter()
            .filter(|g| g.has_fired())
            .map(|g| g.config.name.as_str())
            .collect();
        log::info!("Fired gags: {}", fired.join(", "));
        log::info!(
            "Final score {} ({})",
            player.stage.director().score(),
            if player.stage.phase() == StagePhase::Result {
                "result reached"
            } else {
                "still playing"
            }
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
