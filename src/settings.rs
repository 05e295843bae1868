//! Game settings and tuning
//!
//! Persisted as JSON: in LocalStorage on the web, natively in the file named
//! by `PUN_TOSS_SETTINGS` (if set).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::director::DirectorTuning;
use crate::interaction::DragTuning;
use crate::sim::WorldTuning;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not access settings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
    #[error("local storage is not available")]
    StorageUnavailable,
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub drag: DragTuning,
    pub director: DirectorTuning,
    pub world: WorldTuning,
    /// Seed for every random choice (pun tilt)
    pub seed: u64,

    // === Accessibility ===
    /// Reduced motion (no camera shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            drag: DragTuning::default(),
            director: DirectorTuning::default(),
            world: WorldTuning::default(),
            seed: 0x5eed,
            reduced_motion: false,
        }
    }
}

fn check(ok: bool, field: &'static str, reason: &'static str) -> Result<(), SettingsError> {
    if ok {
        Ok(())
    } else {
        Err(SettingsError::Invalid { field, reason })
    }
}

fn non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

impl Settings {
    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "pun_toss_settings";
    /// Environment variable naming the native settings file
    pub const PATH_ENV: &'static str = "PUN_TOSS_SETTINGS";

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let drag = &self.drag;
        check(
            drag.max_drag_speed.is_none_or(|v| v.is_finite() && v > 0.0),
            "drag.max_drag_speed",
            "must be positive",
        )?;
        check(
            drag.max_throw_speed.is_none_or(non_negative),
            "drag.max_throw_speed",
            "must not be negative",
        )?;
        check(non_negative(drag.force_multiplier), "drag.force_multiplier", "must not be negative")?;
        check(drag.torque_multiplier.is_finite(), "drag.torque_multiplier", "must be a number")?;

        let director = &self.director;
        check(non_negative(director.display_delay), "director.display_delay", "must not be negative")?;
        check(non_negative(director.result_delay), "director.result_delay", "must not be negative")?;
        check(director.max_tilt_deg.is_finite(), "director.max_tilt_deg", "must be a number")?;
        check(
            director.display_secs.is_none_or(non_negative),
            "director.display_secs",
            "must not be negative",
        )?;
        check(director.result_score > 0, "director.result_score", "must be at least 1")?;

        let world = &self.world;
        check(world.gravity.is_finite(), "world.gravity", "must be a number")?;
        check(
            (0.0..=1.0).contains(&world.restitution),
            "world.restitution",
            "must be within 0..=1",
        )?;
        check((0.0..=1.0).contains(&world.friction), "world.friction", "must be within 0..=1")?;
        check(non_negative(world.linear_damping), "world.linear_damping", "must not be negative")?;
        check(non_negative(world.angular_damping), "world.angular_damping", "must not be negative")?;
        Ok(())
    }

    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Director tuning with accessibility applied
    pub fn effective_director(&self) -> DirectorTuning {
        let mut tuning = self.director.clone();
        if self.reduced_motion {
            tuning.shake_strength = 0.0;
        }
        tuning
    }

    /// Load, falling back to defaults on any error
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring stored settings: {e}");
                Self::default()
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn storage() -> Result<web_sys::Storage, SettingsError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(SettingsError::StorageUnavailable)
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn try_load() -> Result<Option<Self>, SettingsError> {
        match Self::storage()?.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => Self::from_json(&json).map(Some),
            _ => Ok(None),
        }
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), SettingsError> {
        let json = serde_json::to_string(self)?;
        Self::storage()?
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| SettingsError::StorageUnavailable)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Load from the file named by `PUN_TOSS_SETTINGS`, if set
    #[cfg(not(target_arch = "wasm32"))]
    pub fn try_load() -> Result<Option<Self>, SettingsError> {
        match std::env::var(Self::PATH_ENV) {
            Ok(path) => Self::load_from_path(&path).map(Some),
            Err(_) => Ok(None),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: &str) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Write to the file named by `PUN_TOSS_SETTINGS` (no-op when unset)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<(), SettingsError> {
        let Ok(path) = std::env::var(Self::PATH_ENV) else {
            return Ok(());
        };
        std::fs::write(&path, self.to_json()?).map_err(|source| SettingsError::Io { path, source })?;
        log::info!("Settings saved");
        Ok(())
    }
}
