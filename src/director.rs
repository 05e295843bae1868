//! Pun display gating and scoring
//!
//! Fired gags ask the director for their pun. Only one pun is on screen at a
//! time, each gag scores once, and reaching the target score brings up the
//! result after a pause. Everything the display side has to do goes out as a
//! `Cue`.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::gag::{ClickStage, GagId};
use crate::sim::BodyId;
use crate::stage::StagePhase;
use crate::timers::Timers;

/// Instructions for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum Cue {
    ShowPun {
        pun_id: String,
        caller: GagId,
        /// Random text tilt (degrees)
        tilt_deg: f32,
    },
    ShakeCamera {
        strength: f32,
        duration: f32,
        vibrato: u32,
    },
    ScoreChanged {
        score: u32,
    },
    ShowResult {
        score: u32,
    },
    /// Click-counting gag changed its look
    Progress {
        gag: GagId,
        stage: ClickStage,
    },
    HoverStart {
        gag: GagId,
        item: BodyId,
    },
    HoverEnd {
        gag: GagId,
        item: BodyId,
    },
    /// Start fading a body out; `BodyRemoved` follows when it is gone
    FadeOut {
        body: BodyId,
        duration: f32,
    },
    BodyRemoved {
        body: BodyId,
    },
    PhaseChanged {
        phase: StagePhase,
    },
}

/// The display side of the game
pub trait Presenter {
    fn present(&mut self, cue: &Cue);
}

/// Collects cues (tests, batching for the web bridge)
impl Presenter for Vec<Cue> {
    fn present(&mut self, cue: &Cue) {
        self.push(cue.clone());
    }
}

/// Writes every cue to the log
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn present(&mut self, cue: &Cue) {
        log::info!("cue: {cue:?}");
    }
}

/// Director tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorTuning {
    /// Wait between a request and the pun appearing (seconds)
    pub display_delay: f32,
    /// Pun text is tilted by up to this many degrees either way
    pub max_tilt_deg: f32,
    /// Close the display after this long when the display side never reports
    /// it closed (None = wait for `display_closed`)
    pub display_secs: Option<f32>,
    pub shake_strength: f32,
    pub shake_duration: f32,
    pub shake_vibrato: u32,
    /// Score that ends the scene
    pub result_score: u32,
    /// Wait between reaching `result_score` and the result (seconds)
    pub result_delay: f32,
}

impl Default for DirectorTuning {
    fn default() -> Self {
        Self {
            display_delay: 0.3,
            max_tilt_deg: 10.0,
            display_secs: Some(2.5),
            shake_strength: 0.2,
            shake_duration: 1.0,
            shake_vibrato: 10,
            result_score: 10,
            result_delay: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
enum Pending {
    Display {
        pun_id: String,
        caller: GagId,
        unique: bool,
    },
    /// Auto-close of the display shown as number `shown`
    Close { shown: u32 },
    Result,
}

pub struct PunDirector {
    pub tuning: DirectorTuning,
    score: u32,
    displaying: bool,
    /// Count of puns shown, to match auto-closes with their display
    shown: u32,
    claimed: BTreeSet<GagId>,
    timers: Timers<Pending>,
    result_scheduled: bool,
    result_shown: bool,
    rng: Pcg32,
}

impl PunDirector {
    pub fn new(tuning: DirectorTuning, seed: u64) -> Self {
        Self {
            tuning,
            score: 0,
            displaying: false,
            shown: 0,
            claimed: BTreeSet::new(),
            timers: Timers::new(),
            result_scheduled: false,
            result_shown: false,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_displaying(&self) -> bool {
        self.displaying
    }

    pub fn has_claimed(&self, caller: GagId) -> bool {
        self.claimed.contains(&caller)
    }

    pub fn result_shown(&self) -> bool {
        self.result_shown
    }

    fn blocked(&self, caller: GagId, unique: bool) -> bool {
        self.displaying || (unique && self.claimed.contains(&caller))
    }

    /// Ask for a pun. Returns false if it was skipped outright.
    ///
    /// An accepted request can still be dropped at delivery if another pun
    /// got on screen first.
    pub fn request(&mut self, pun_id: &str, caller: GagId, unique: bool) -> bool {
        if self.blocked(caller, unique) {
            log::debug!("Pun '{pun_id}' from gag {caller} skipped");
            return false;
        }
        self.timers.schedule(
            self.tuning.display_delay,
            Pending::Display {
                pun_id: pun_id.to_string(),
                caller,
                unique,
            },
        );
        true
    }

    /// The display side reports the pun went away
    pub fn display_closed(&mut self) {
        self.displaying = false;
    }

    /// Advance pending displays and the result countdown
    pub fn update(&mut self, dt: f32) -> Vec<Cue> {
        let mut cues = Vec::new();
        for pending in self.timers.advance(dt) {
            match pending {
                Pending::Display { pun_id, caller, unique } => self.deliver(pun_id, caller, unique, &mut cues),
                Pending::Close { shown } => {
                    if self.shown == shown {
                        self.display_closed();
                    }
                }
                Pending::Result => {
                    self.result_shown = true;
                    log::info!("Result reached with score {}", self.score);
                    cues.push(Cue::ShowResult { score: self.score });
                }
            }
        }
        cues
    }

    fn deliver(&mut self, pun_id: String, caller: GagId, unique: bool, cues: &mut Vec<Cue>) {
        if self.blocked(caller, unique) {
            log::debug!("Pun '{pun_id}' from gag {caller} dropped at delivery");
            return;
        }

        self.displaying = true;
        self.shown += 1;
        self.claimed.insert(caller);
        self.score += 1;

        let max_tilt = self.tuning.max_tilt_deg.abs();
        let tilt_deg = self.rng.random_range(-max_tilt..=max_tilt);
        log::info!("Showing pun '{pun_id}' (score {})", self.score);

        cues.push(Cue::ShowPun {
            pun_id,
            caller,
            tilt_deg,
        });
        cues.push(Cue::ShakeCamera {
            strength: self.tuning.shake_strength,
            duration: self.tuning.shake_duration,
            vibrato: self.tuning.shake_vibrato,
        });
        cues.push(Cue::ScoreChanged { score: self.score });

        if let Some(secs) = self.tuning.display_secs {
            self.timers.schedule(secs, Pending::Close { shown: self.shown });
        }
        if self.score >= self.tuning.result_score && !self.result_scheduled {
            self.result_scheduled = true;
            self.timers.schedule(self.tuning.result_delay, Pending::Result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn manual_close() -> DirectorTuning {
        DirectorTuning {
            display_secs: None,
            ..Default::default()
        }
    }

    fn run(director: &mut PunDirector, secs: f32) -> Vec<Cue> {
        let steps = (secs / SIM_DT).round() as usize;
        (0..steps).flat_map(|_| director.update(SIM_DT)).collect()
    }

    #[test]
    fn test_pun_shown_after_delay() {
        let mut director = PunDirector::new(manual_close(), 7);
        assert!(director.request("futon", 0, true));

        assert!(run(&mut director, 0.2).is_empty());
        let cues = run(&mut director, 0.1);
        assert_eq!(cues.len(), 3);
        match &cues[0] {
            Cue::ShowPun { pun_id, caller, tilt_deg } => {
                assert_eq!(pun_id, "futon");
                assert_eq!(*caller, 0);
                assert!(tilt_deg.abs() <= 10.0);
            }
            other => panic!("expected ShowPun, got {other:?}"),
        }
        assert!(matches!(cues[1], Cue::ShakeCamera { vibrato: 10, .. }));
        assert_eq!(cues[2], Cue::ScoreChanged { score: 1 });
        assert!(director.is_displaying());
        assert!(director.has_claimed(0));
    }

    #[test]
    fn test_one_display_at_a_time() {
        let mut director = PunDirector::new(manual_close(), 7);
        // Both pass the first check, only the first reaches the screen
        assert!(director.request("futon", 0, true));
        assert!(director.request("isi", 1, true));
        let cues = run(&mut director, 0.5);
        assert_eq!(cues.iter().filter(|c| matches!(c, Cue::ShowPun { .. })).count(), 1);

        // Skipped outright while displaying
        assert!(!director.request("neko", 2, true));

        director.display_closed();
        assert!(director.request("neko", 2, true));
        run(&mut director, 0.5);
        assert_eq!(director.score(), 2);
    }

    #[test]
    fn test_caller_scores_once() {
        let mut director = PunDirector::new(manual_close(), 7);
        director.request("neko", 3, true);
        run(&mut director, 0.5);
        director.display_closed();
        assert!(!director.request("neko", 3, true));

        // Non-unique callers may come back
        director.request("seal", 4, false);
        run(&mut director, 0.5);
        director.display_closed();
        assert!(director.request("seal", 4, false));
        run(&mut director, 0.5);
        assert_eq!(director.score(), 3);
    }

    #[test]
    fn test_auto_close() {
        let mut director = PunDirector::new(DirectorTuning::default(), 7);
        director.request("futon", 0, true);
        run(&mut director, 0.5);
        assert!(director.is_displaying());
        run(&mut director, 2.5);
        assert!(!director.is_displaying());
    }

    #[test]
    fn test_result_after_target_score() {
        let tuning = DirectorTuning {
            result_score: 2,
            display_secs: None,
            ..Default::default()
        };
        let mut director = PunDirector::new(tuning, 7);
        for caller in 0..2 {
            director.request("pun", caller, true);
            run(&mut director, 0.3);
            director.display_closed();
        }
        assert_eq!(director.score(), 2);
        assert!(!director.result_shown());

        let cues = run(&mut director, 2.9);
        assert!(!cues.iter().any(|c| matches!(c, Cue::ShowResult { .. })));
        let cues = run(&mut director, 0.2);
        assert!(cues.contains(&Cue::ShowResult { score: 2 }));
        assert!(director.result_shown());

        // Only once
        director.request("pun", 9, true);
        let cues = run(&mut director, 5.0);
        assert!(!cues.iter().any(|c| matches!(c, Cue::ShowResult { .. })));
    }

    #[test]
    fn test_tilt_is_deterministic_per_seed() {
        let tilt = |seed| {
            let mut director = PunDirector::new(manual_close(), seed);
            director.request("futon", 0, true);
            run(&mut director, 0.5)
                .into_iter()
                .find_map(|c| match c {
                    Cue::ShowPun { tilt_deg, .. } => Some(tilt_deg),
                    _ => None,
                })
                .unwrap()
        };
        assert_eq!(tilt(42), tilt(42));
    }

    #[test]
    fn test_cue_json() {
        let json = serde_json::to_string(&Cue::ScoreChanged { score: 3 }).unwrap();
        assert_eq!(json, r#"{"cue":"score_changed","score":3}"#);
    }
}
