//! Fixed timestep orchestration
//!
//! A `Stage` owns the physics world and every gameplay piece wired to it, and
//! advances them together one fixed step at a time. Per step:
//! 1. Pause toggle
//! 2. Press: click routing, then grab
//! 3. Release (throw + release routing) or drag update
//! 4. Gimmick forces, physics step, contact routing, gimmick corrections
//! 5. Gag timers and gag outcomes
//! 6. Due continuations, director, result check

use glam::Vec2;
use serde::Serialize;

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::director::{Cue, Presenter, PunDirector};
use crate::gag::{Condition, Gag, GagConfig, GagEvent, GagId, ItemFate};
use crate::gimmick::{Gimmick, GimmickConfig, GimmickEvent, GimmickId};
use crate::interaction::{InteractionManager, ReleaseEvent};
use crate::relay::{Listener, Relay, Signal};
use crate::settings::Settings;
use crate::sim::{BodyId, PhysicsWorld};
use crate::timers::Timers;

/// Stage phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    #[default]
    Playing,
    Paused,
    /// Result is up; the scene is frozen
    Result,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct StageInput {
    /// Pointer position in world units
    pub pointer: Vec2,
    /// Pointer went down this tick
    pub press: bool,
    /// Pointer went up this tick
    pub release: bool,
    /// A UI element is under the pointer
    pub over_ui: bool,
    /// Pause toggle
    pub pause: bool,
}

impl StageInput {
    /// Clear one-shot inputs after they were processed
    pub fn consume(&mut self) {
        self.press = false;
        self.release = false;
        self.pause = false;
    }
}

/// Frame-time accumulator that hands out fixed steps
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedClock {
    accumulator: f32,
}

impl FixedClock {
    /// Longest frame accounted for; anything beyond is dropped
    pub const MAX_FRAME: f32 = 0.1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame's worth of time and return how many steps of `SIM_DT` to run
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, Self::MAX_FRAME);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }
}

/// Continuations the stage parks on its timers
#[derive(Debug, Clone, Copy)]
enum Deferred {
    /// Delayed pun request of a fired gag
    Notify(GagId),
    FadeStart { body: BodyId, duration: f32 },
    Remove(BodyId),
}

pub struct Stage<W: PhysicsWorld> {
    pub world: W,
    pub interaction: InteractionManager,
    relay: Relay,
    gags: Vec<Gag>,
    gimmicks: Vec<Gimmick>,
    timers: Timers<Deferred>,
    director: PunDirector,
    phase: StagePhase,
    cues: Vec<Cue>,
    /// Simulated (unpaused) time in seconds
    time: f64,
}

impl<W: PhysicsWorld> Stage<W> {
    pub fn new(world: W, settings: &Settings) -> Self {
        Self {
            world,
            interaction: InteractionManager::new(settings.drag.clone()),
            relay: Relay::new(),
            gags: Vec::new(),
            gimmicks: Vec::new(),
            timers: Timers::new(),
            director: PunDirector::new(settings.effective_director(), settings.seed),
            phase: StagePhase::Playing,
            cues: Vec::new(),
            time: 0.0,
        }
    }

    pub fn add_gag(&mut self, config: GagConfig) -> GagId {
        let id = self.gags.len() as GagId;
        let gag = Gag::new(id, config);
        for (body, signal) in gag.subscriptions() {
            self.relay.subscribe(body, signal, Listener::Gag(id));
        }
        log::debug!("Added gag {id} '{}'", gag.config.name);
        self.gags.push(gag);
        id
    }

    pub fn add_gimmick(&mut self, config: GimmickConfig) -> GimmickId {
        let id = self.gimmicks.len() as GimmickId;
        let gimmick = Gimmick::new(id, config);
        for (body, signal) in gimmick.subscriptions() {
            self.relay.subscribe(body, signal, Listener::Gimmick(id));
        }
        self.gimmicks.push(gimmick);
        id
    }

    pub fn phase(&self) -> StagePhase {
        self.phase
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn gags(&self) -> &[Gag] {
        &self.gags
    }

    pub fn gag(&self, id: GagId) -> Option<&Gag> {
        self.gags.get(id as usize)
    }

    /// Look up a gag by its configured name
    pub fn find_gag(&self, name: &str) -> Option<GagId> {
        self.gags.iter().find(|g| g.config.name == name).map(|g| g.id)
    }

    pub fn gimmicks(&self) -> &[Gimmick] {
        &self.gimmicks
    }

    pub fn director(&self) -> &PunDirector {
        &self.director
    }

    /// The display side reports the current pun went away
    pub fn display_closed(&mut self) {
        self.director.display_closed();
    }

    /// Take the cues produced so far
    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    /// Hand the cues produced so far to a presenter
    pub fn present(&mut self, presenter: &mut impl Presenter) {
        for cue in self.drain_cues() {
            presenter.present(&cue);
        }
    }

    fn set_phase(&mut self, phase: StagePhase) {
        if self.phase != phase {
            log::info!("Stage phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            self.cues.push(Cue::PhaseChanged { phase });
        }
    }

    /// Advance the stage by one fixed timestep
    pub fn tick(&mut self, input: &StageInput, dt: f32) {
        // Handle pause toggle
        if input.pause {
            match self.phase {
                StagePhase::Playing => {
                    self.interaction.cancel();
                    self.set_phase(StagePhase::Paused);
                    return;
                }
                StagePhase::Paused => self.set_phase(StagePhase::Playing),
                StagePhase::Result => {}
            }
        }
        if self.phase != StagePhase::Playing {
            return;
        }
        self.time += f64::from(dt);

        let mut outcomes: Vec<(GagId, GagEvent)> = Vec::new();

        // An up and a down in the same step: finish the held drag before
        // grabbing again, but let a quick click on a free pointer grab first
        let release_first = input.release && self.interaction.is_active();
        if release_first {
            self.release(input, dt, &mut outcomes);
        }
        if input.press {
            self.press(input, &mut outcomes);
        }
        if input.release && !release_first {
            self.release(input, dt, &mut outcomes);
        } else if !input.release && self.interaction.is_active() {
            self.interaction.update_drag(&mut self.world, input.pointer, dt);
        }

        for gimmick in &self.gimmicks {
            gimmick.pre_step(&mut self.world);
        }

        let contacts = self.world.step(dt);
        let dragging = self.interaction.dragged_body();
        for contact in &contacts {
            for (listener, notice) in self.relay.route_contact(contact) {
                match listener {
                    Listener::Gag(id) => {
                        if let Some(gag) = self.gags.get_mut(id as usize) {
                            let events = gag.on_contact(notice, &self.world, dragging);
                            outcomes.extend(events.into_iter().map(|e| (id, e)));
                        }
                    }
                    Listener::Gimmick(id) => {
                        if let Some(gimmick) = self.gimmicks.get_mut(id as usize) {
                            gimmick.on_contact(notice);
                        }
                    }
                }
            }
        }

        for gimmick in &mut self.gimmicks {
            if let Some(GimmickEvent::Absorbed { weight, .. }) = gimmick.post_step(&mut self.world) {
                self.cues.push(Cue::BodyRemoved { body: weight });
            }
        }

        for gag in &mut self.gags {
            let id = gag.id;
            outcomes.extend(gag.update(dt, &self.world).into_iter().map(|e| (id, e)));
        }

        for (id, event) in outcomes {
            self.apply_gag_event(id, event);
        }

        for deferred in self.timers.advance(dt) {
            self.resume(deferred);
        }

        let cues = self.director.update(dt);
        self.cues.extend(cues);
        if self.director.result_shown() {
            self.interaction.cancel();
            self.set_phase(StagePhase::Result);
        }

        self.interaction.drop_if_missing(&self.world);
    }

    fn press(&mut self, input: &StageInput, outcomes: &mut Vec<(GagId, GagEvent)>) {
        if !input.over_ui
            && let Some(clicked) = self.world.hit_test(input.pointer)
        {
            for listener in self.relay.listeners(clicked, Signal::Click).to_vec() {
                if let Listener::Gag(id) = listener
                    && let Some(gag) = self.gags.get_mut(id as usize)
                {
                    outcomes.extend(gag.on_click(clicked).into_iter().map(|e| (id, e)));
                }
            }
        }

        match self.interaction.begin_drag(&self.world, input.pointer, input.over_ui) {
            Ok(_) => {}
            Err(reason) => log::debug!("Grab refused: {reason:?}"),
        }
    }

    fn release(&mut self, input: &StageInput, dt: f32, outcomes: &mut Vec<(GagId, GagEvent)>) {
        let released = self.interaction.end_drag(&mut self.world, input.pointer, dt, self.time);
        if let Some(release) = released {
            self.route_release(&release, outcomes);
        }
    }

    fn route_release(&mut self, release: &ReleaseEvent, outcomes: &mut Vec<(GagId, GagEvent)>) {
        for listener in self.relay.listeners(release.body, Signal::Release).to_vec() {
            if let Listener::Gag(id) = listener
                && let Some(gag) = self.gags.get_mut(id as usize)
            {
                outcomes.extend(gag.on_release(release, &self.world).into_iter().map(|e| (id, e)));
            }
        }
    }

    fn apply_gag_event(&mut self, id: GagId, event: GagEvent) {
        match event {
            GagEvent::Fired => self.on_fired(id),
            GagEvent::Progress(stage) => self.cues.push(Cue::Progress { gag: id, stage }),
            GagEvent::HoverStart { item } => self.cues.push(Cue::HoverStart { gag: id, item }),
            GagEvent::HoverEnd { item } => self.cues.push(Cue::HoverEnd { gag: id, item }),
            GagEvent::Rearmed => {}
        }
    }

    fn on_fired(&mut self, id: GagId) {
        let Some(gag) = self.gags.get(id as usize) else {
            return;
        };
        let config = &gag.config;
        let (subject, fire_delay, fade) = (config.subject, config.fire_delay, config.fade);
        let given = match config.condition {
            Condition::Give { item, fate, .. } => Some((item, fate)),
            _ => None,
        };

        if fire_delay > 0.0 {
            self.timers.schedule(fire_delay, Deferred::Notify(id));
        } else {
            self.notify(id);
        }

        if let Some(fade) = fade {
            self.timers.schedule(
                fade.interval,
                Deferred::FadeStart {
                    body: subject,
                    duration: fade.duration,
                },
            );
        }

        match given {
            Some((item, ItemFate::Destroy)) => {
                if self.interaction.is_dragging(item) {
                    self.interaction.cancel();
                }
                if self.world.destroy(item) {
                    self.cues.push(Cue::BodyRemoved { body: item });
                }
            }
            Some((item, ItemFate::Pin)) => self.interaction.lock(item),
            None => {}
        }
    }

    /// Ask the director for the gag's pun, unless its object is gone
    fn notify(&mut self, id: GagId) {
        let Some(gag) = self.gags.get(id as usize) else {
            return;
        };
        if !self.world.exists(gag.config.subject) {
            log::debug!("Gag '{}' lost its subject before notifying", gag.config.name);
            return;
        }
        self.director.request(&gag.config.pun_id, id, gag.config.unique);
    }

    fn resume(&mut self, deferred: Deferred) {
        match deferred {
            Deferred::Notify(id) => self.notify(id),
            Deferred::FadeStart { body, duration } => {
                if self.world.exists(body) {
                    self.cues.push(Cue::FadeOut { body, duration });
                    self.timers.schedule(duration, Deferred::Remove(body));
                }
            }
            Deferred::Remove(body) => {
                if self.world.destroy(body) {
                    self.cues.push(Cue::BodyRemoved { body });
                }
            }
        }
    }
}
