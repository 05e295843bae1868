//! Browser bridge
//!
//! JavaScript owns the canvas and the pun display. It feeds pointer events
//! in, calls `frame` once per animation frame, and plays the returned cues.

use wasm_bindgen::prelude::*;

use crate::consts::SIM_DT;
use crate::scene::SceneSpec;
use crate::settings::Settings;
use crate::sim::World;
use crate::stage::{FixedClock, Stage, StageInput};

#[wasm_bindgen(start)]
pub fn start() {
    super::init_logging();
    log::info!("Pun Toss (web) starting...");
}

#[wasm_bindgen]
pub struct WebStage {
    stage: Stage<World>,
    clock: FixedClock,
    input: StageInput,
    settings: Settings,
}

impl WebStage {
    fn with_stage(stage: Stage<World>, settings: Settings) -> Self {
        Self {
            stage,
            clock: FixedClock::new(),
            input: StageInput::default(),
            settings,
        }
    }
}

#[wasm_bindgen]
impl WebStage {
    /// Stage with the built-in scene and the stored settings
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebStage, JsError> {
        let settings = Settings::load();
        let stage = SceneSpec::demo()?.build(&settings)?;
        Ok(Self::with_stage(stage, settings))
    }

    /// Stage with a scene supplied as JSON
    pub fn from_scene_json(json: &str) -> Result<WebStage, JsError> {
        let settings = Settings::load();
        let stage = SceneSpec::from_json(json)?.build(&settings)?;
        Ok(Self::with_stage(stage, settings))
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.input.pointer = glam::Vec2::new(x, y);
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, over_ui: bool) {
        self.pointer_move(x, y);
        self.input.over_ui = over_ui;
        self.input.press = true;
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        self.pointer_move(x, y);
        self.input.release = true;
    }

    pub fn toggle_pause(&mut self) {
        self.input.pause = true;
    }

    /// The pun display finished playing
    pub fn pun_closed(&mut self) {
        self.stage.display_closed();
    }

    /// Run the fixed steps owed for `dt` seconds of frame time and return the
    /// cues they produced as a JSON array
    pub fn frame(&mut self, dt: f32) -> Result<String, JsError> {
        for _ in 0..self.clock.advance(dt) {
            self.stage.tick(&self.input, SIM_DT);
            self.input.consume();
        }
        Ok(serde_json::to_string(&self.stage.drain_cues())?)
    }

    /// Every body's current transform as a JSON array
    pub fn bodies_json(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(self.stage.world.bodies())?)
    }

    pub fn score(&self) -> u32 {
        self.stage.director().score()
    }

    pub fn phase(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.stage.phase())?)
    }

    /// Stored for the next load
    pub fn set_reduced_motion(&mut self, reduced: bool) -> Result<(), JsError> {
        self.settings.reduced_motion = reduced;
        self.settings.save()?;
        Ok(())
    }
}
