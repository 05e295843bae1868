//! Gag configuration
//!
//! Configs are generic over how bodies are referenced: scenes name bodies
//! (`GagConfig<String>`), the stage runs on resolved ids (`GagConfig<BodyId>`).

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FADE_DURATION, DEFAULT_FADE_INTERVAL};
use crate::sim::BodyId;

/// When a fired gag may fire again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rearm {
    /// Fired is terminal
    #[default]
    Never,
    /// Re-arms once the watched contact ends (or the angle leaves its window)
    OnContactLoss,
    /// Re-arms on the subject's next release
    OnRelease,
}

/// What happens to a given item once the receiver accepts it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemFate {
    #[default]
    Destroy,
    /// Item stays in the scene but can no longer be dragged
    Pin,
}

/// Post-fire fade of the gag's subject
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeOut {
    /// Wait after firing before the fade starts (seconds)
    pub interval: f32,
    /// Fade length; the subject is destroyed when it ends (seconds)
    pub duration: f32,
}

impl Default for FadeOut {
    fn default() -> Self {
        Self {
            interval: DEFAULT_FADE_INTERVAL,
            duration: DEFAULT_FADE_DURATION,
        }
    }
}

/// The physical situation a gag waits for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition<B = BodyId> {
    /// Subject thrown at least this fast
    ReleaseSpeed { min_speed: f32 },
    /// Subject let go at or above this height
    ReleaseHeight { min_y: f32 },
    /// Subject clicked this many times
    Clicks { required: u32 },
    /// `target` stays inside `zone` for `hold_secs`
    Dwell { zone: B, target: B, hold_secs: f32 },
    /// Subject lies on a `ground_tag` body tilted at least `min_tilt_deg`
    Tilted {
        ground_tag: String,
        min_tilt_deg: f32,
        hold_secs: f32,
    },
    /// Subject rotation stays in `[min_deg, max_deg]`
    AngleWindow {
        min_deg: f32,
        max_deg: f32,
        hold_secs: f32,
    },
    /// `item` dropped onto `receiver`
    Give {
        receiver: B,
        item: B,
        #[serde(default)]
        fate: ItemFate,
    },
}

impl<B> Condition<B> {
    /// Re-reference every body, failing on the first one `f` rejects
    pub fn try_map<C, E>(self, mut f: impl FnMut(B) -> Result<C, E>) -> Result<Condition<C>, E> {
        Ok(match self {
            Condition::ReleaseSpeed { min_speed } => Condition::ReleaseSpeed { min_speed },
            Condition::ReleaseHeight { min_y } => Condition::ReleaseHeight { min_y },
            Condition::Clicks { required } => Condition::Clicks { required },
            Condition::Dwell {
                zone,
                target,
                hold_secs,
            } => Condition::Dwell {
                zone: f(zone)?,
                target: f(target)?,
                hold_secs,
            },
            Condition::Tilted {
                ground_tag,
                min_tilt_deg,
                hold_secs,
            } => Condition::Tilted {
                ground_tag,
                min_tilt_deg,
                hold_secs,
            },
            Condition::AngleWindow {
                min_deg,
                max_deg,
                hold_secs,
            } => Condition::AngleWindow {
                min_deg,
                max_deg,
                hold_secs,
            },
            Condition::Give { receiver, item, fate } => Condition::Give {
                receiver: f(receiver)?,
                item: f(item)?,
                fate,
            },
        })
    }

    /// Continuous hold time, for conditions that accumulate one
    pub fn hold_secs(&self) -> Option<f32> {
        match self {
            Condition::Dwell { hold_secs, .. }
            | Condition::Tilted { hold_secs, .. }
            | Condition::AngleWindow { hold_secs, .. } => Some(*hold_secs),
            _ => None,
        }
    }
}

fn default_unique() -> bool {
    true
}

/// One gag: which object, what condition, which pun
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GagConfig<B = BodyId> {
    pub name: String,
    /// Key of the pun shown when this gag fires
    pub pun_id: String,
    /// The object the gag belongs to; a pending notification is dropped if
    /// it no longer exists, and `fade` removes it
    pub subject: B,
    pub condition: Condition<B>,
    /// Delay between firing and the pun request (seconds)
    #[serde(default)]
    pub fire_delay: f32,
    #[serde(default)]
    pub rearm: Rearm,
    #[serde(default)]
    pub fade: Option<FadeOut>,
    /// Count this gag's pun at most once
    #[serde(default = "default_unique")]
    pub unique: bool,
}

impl<B> GagConfig<B> {
    pub fn new(name: impl Into<String>, pun_id: impl Into<String>, subject: B, condition: Condition<B>) -> Self {
        Self {
            name: name.into(),
            pun_id: pun_id.into(),
            subject,
            condition,
            fire_delay: 0.0,
            rearm: Rearm::Never,
            fade: None,
            unique: true,
        }
    }

    pub fn with_fire_delay(mut self, secs: f32) -> Self {
        self.fire_delay = secs;
        self
    }

    pub fn with_rearm(mut self, rearm: Rearm) -> Self {
        self.rearm = rearm;
        self
    }

    pub fn with_fade(mut self, fade: FadeOut) -> Self {
        self.fade = Some(fade);
        self
    }

    pub fn try_map<C, E>(self, mut f: impl FnMut(B) -> Result<C, E>) -> Result<GagConfig<C>, E> {
        Ok(GagConfig {
            subject: f(self.subject)?,
            condition: self.condition.try_map(&mut f)?,
            name: self.name,
            pun_id: self.pun_id,
            fire_delay: self.fire_delay,
            rearm: self.rearm,
            fade: self.fade,
            unique: self.unique,
        })
    }

    /// Problems with the numeric parameters, if any
    pub fn invalid_reason(&self) -> Option<&'static str> {
        let bad = |v: f32| v.is_nan() || v < 0.0;
        if bad(self.fire_delay) {
            return Some("fire_delay must be a non-negative number");
        }
        if let Some(fade) = &self.fade
            && (bad(fade.interval) || bad(fade.duration))
        {
            return Some("fade times must be non-negative numbers");
        }
        if self.condition.hold_secs().is_some_and(bad) {
            return Some("hold_secs must be a non-negative number");
        }
        match &self.condition {
            Condition::Clicks { required: 0 } => Some("required clicks must be at least 1"),
            Condition::AngleWindow { min_deg, max_deg, .. } if min_deg > max_deg => {
                Some("angle window is empty (min_deg > max_deg)")
            }
            _ => None,
        }
    }
}
