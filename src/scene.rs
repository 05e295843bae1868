//! Data-driven scene description
//!
//! Scenes are JSON: a list of bodies plus the gags and gimmicks wired to them
//! by body name. Building a scene spawns the bodies into a fresh `World` and
//! resolves names to ids. A gag or gimmick that names a missing body, or has
//! unusable parameters, is a configuration error: it is logged and skipped,
//! the rest of the scene still loads.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gag::GagConfig;
use crate::gimmick::GimmickConfig;
use crate::settings::Settings;
use crate::sim::{Body, BodyId, BodyKind, World};
use crate::stage::Stage;

const DEMO_SCENE: &str = include_str!("../assets/demo_scene.json");

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("malformed scene: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("body name `{0}` is used more than once")]
    DuplicateBody(String),
    #[error("body `{name}` is invalid: {reason}")]
    InvalidBody { name: String, reason: &'static str },
}

fn default_mass() -> f32 {
    1.0
}

/// A body as written in a scene file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodySpec {
    pub name: String,
    #[serde(default)]
    pub kind: BodyKind,
    pub pos: Vec2,
    pub half_extents: Vec2,
    #[serde(default)]
    pub rotation_deg: f32,
    #[serde(default = "default_mass")]
    pub mass: f32,
    #[serde(default)]
    pub sensor: bool,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub layer: i32,
}

impl BodySpec {
    fn to_body(&self) -> Result<Body, SceneError> {
        let invalid = |reason| SceneError::InvalidBody {
            name: self.name.clone(),
            reason,
        };
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(invalid("mass must be positive"));
        }
        if !(self.half_extents.is_finite() && self.half_extents.cmpgt(Vec2::ZERO).all()) {
            return Err(invalid("half extents must be positive"));
        }

        let mut body = Body::new(self.name.clone(), self.kind, self.pos, self.half_extents)
            .with_mass(self.mass)
            .with_rotation_degrees(self.rotation_deg)
            .with_layer(self.layer);
        body.sensor = self.sensor;
        body.tag = self.tag.clone();
        Ok(body)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneSpec {
    pub bodies: Vec<BodySpec>,
    #[serde(default)]
    pub gags: Vec<GagConfig<String>>,
    #[serde(default)]
    pub gimmicks: Vec<GimmickConfig<String>>,
}

impl SceneSpec {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The built-in scene with one of every gag
    pub fn demo() -> Result<Self, SceneError> {
        Self::from_json(DEMO_SCENE)
    }

    /// Spawn the bodies and wire everything that resolves
    pub fn build(&self, settings: &Settings) -> Result<Stage<World>, SceneError> {
        let mut world = World::new(settings.world.clone());
        let mut ids: BTreeMap<&str, BodyId> = BTreeMap::new();
        for spec in &self.bodies {
            if ids.contains_key(spec.name.as_str()) {
                return Err(SceneError::DuplicateBody(spec.name.clone()));
            }
            let id = world.spawn(spec.to_body()?);
            ids.insert(spec.name.as_str(), id);
        }

        let resolve = |name: String| ids.get(name.as_str()).copied().ok_or(name);
        let mut stage = Stage::new(world, settings);

        for config in &self.gags {
            let gag_name = config.name.clone();
            match config.clone().try_map(resolve) {
                Ok(resolved) => match resolved.invalid_reason() {
                    None => {
                        stage.add_gag(resolved);
                    }
                    Some(reason) => log::warn!("Skipping gag '{gag_name}': {reason}"),
                },
                Err(missing) => log::warn!("Skipping gag '{gag_name}': no body named '{missing}'"),
            }
        }

        for config in &self.gimmicks {
            match config.clone().try_map(resolve) {
                Ok(resolved) => {
                    stage.add_gimmick(resolved);
                }
                Err(missing) => log::warn!("Skipping gimmick: no body named '{missing}'"),
            }
        }

        log::info!(
            "Scene built: {} bodies, {} gags, {} gimmicks",
            self.bodies.len(),
            stage.gags().len(),
            stage.gimmicks().len()
        );
        Ok(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::director::Cue;
    use crate::gag::Condition;
    use crate::gimmick::Gimmick;
    use crate::sim::PhysicsWorld;
    use crate::stage::StageInput;

    const SMALL: &str = r#"{
        "bodies": [
            { "name": "floor", "kind": "static", "pos": [0.0, -1.0], "half_extents": [10.0, 1.0], "tag": "Ground" },
            { "name": "futon", "pos": [0.0, 0.5], "half_extents": [0.5, 0.5] }
        ],
        "gags": [
            {
                "name": "futon",
                "pun_id": "futon",
                "subject": "futon",
                "condition": { "kind": "release_speed", "min_speed": 50.0 }
            },
            {
                "name": "ghost",
                "pun_id": "nobody",
                "subject": "ghost",
                "condition": { "kind": "clicks", "required": 3 }
            },
            {
                "name": "broken",
                "pun_id": "broken",
                "subject": "futon",
                "condition": { "kind": "clicks", "required": 0 }
            }
        ],
        "gimmicks": [
            { "kind": "speed_limiter", "body": "futon" },
            { "kind": "ballast", "bag": "futon", "weight": "anvil" }
        ]
    }"#;

    #[test]
    fn test_build_skips_unresolved() {
        let scene = SceneSpec::from_json(SMALL).unwrap();
        let stage = scene.build(&Settings::default()).unwrap();

        assert_eq!(stage.world.bodies().len(), 2);
        assert_eq!(stage.gags().len(), 1);
        assert_eq!(stage.gags()[0].config.subject, 2);
        assert_eq!(stage.gimmicks().len(), 1);
        assert!(stage.find_gag("ghost").is_none());
    }

    #[test]
    fn test_body_defaults() {
        let scene = SceneSpec::from_json(SMALL).unwrap();
        let futon = &scene.bodies[1];
        assert_eq!(futon.kind, BodyKind::Dynamic);
        assert_eq!(futon.mass, 1.0);
        assert!(!futon.sensor);
    }

    #[test]
    fn test_duplicate_body_rejected() {
        let json = r#"{ "bodies": [
            { "name": "a", "pos": [0.0, 0.0], "half_extents": [1.0, 1.0] },
            { "name": "a", "pos": [3.0, 0.0], "half_extents": [1.0, 1.0] }
        ] }"#;
        let scene = SceneSpec::from_json(json).unwrap();
        assert!(matches!(
            scene.build(&Settings::default()),
            Err(SceneError::DuplicateBody(name)) if name == "a"
        ));
    }

    #[test]
    fn test_invalid_body_rejected() {
        let json = r#"{ "bodies": [
            { "name": "flat", "pos": [0.0, 0.0], "half_extents": [1.0, 0.0] }
        ] }"#;
        let scene = SceneSpec::from_json(json).unwrap();
        assert!(matches!(
            scene.build(&Settings::default()),
            Err(SceneError::InvalidBody { .. })
        ));
    }

    #[test]
    fn test_demo_has_every_gag() {
        let scene = SceneSpec::demo().unwrap();
        let stage = scene.build(&Settings::default()).unwrap();
        assert_eq!(stage.gags().len(), scene.gags.len());
        assert_eq!(stage.gimmicks().len(), scene.gimmicks.len());

        let has = |pred: fn(&Condition) -> bool| stage.gags().iter().any(|g| pred(&g.config.condition));
        assert!(has(|c| matches!(c, Condition::ReleaseSpeed { .. })));
        assert!(has(|c| matches!(c, Condition::ReleaseHeight { .. })));
        assert!(has(|c| matches!(c, Condition::Clicks { .. })));
        assert!(has(|c| matches!(c, Condition::Dwell { .. })));
        assert!(has(|c| matches!(c, Condition::Tilted { .. })));
        assert!(has(|c| matches!(c, Condition::AngleWindow { .. })));
        assert!(has(|c| matches!(c, Condition::Give { .. })));
    }

    #[test]
    fn test_demo_settles_without_firing() {
        let scene = SceneSpec::demo().unwrap();
        let mut stage = scene.build(&Settings::default()).unwrap();
        let input = StageInput::default();
        for _ in 0..(3.0 / SIM_DT) as usize {
            stage.tick(&input, SIM_DT);
        }
        let fired: Vec<_> = stage
            .gags()
            .iter()
            .filter(|g| g.has_fired())
            .map(|g| g.config.name.clone())
            .collect();
        assert!(fired.is_empty(), "fired at rest: {fired:?}");
        assert!(
            !stage
                .drain_cues()
                .iter()
                .any(|c| matches!(c, Cue::ShowPun { .. }))
        );
    }

    #[test]
    fn test_demo_futon_scores_every_throw() {
        let scene = SceneSpec::demo().unwrap();
        let mut stage = scene.build(&Settings::default()).unwrap();
        let futon = stage.world.find("futon").unwrap();
        let start = stage.world.body(futon).unwrap().pos;
        let idle = StageInput::default();
        for _ in 0..(1.0 / SIM_DT) as usize {
            stage.tick(&idle, SIM_DT);
        }

        let mut cues = Vec::new();
        for _ in 0..2 {
            stage.world.set_position(futon, start);
            stage.world.set_velocity(futon, Vec2::ZERO, 0.0);
            let press = StageInput {
                pointer: start,
                press: true,
                ..Default::default()
            };
            stage.tick(&press, SIM_DT);
            // 1.2 units in one step = 60 u/s
            let throw = StageInput {
                pointer: start + Vec2::new(1.2, 0.0),
                release: true,
                ..Default::default()
            };
            stage.tick(&throw, SIM_DT);
            for _ in 0..(1.0 / SIM_DT) as usize {
                stage.tick(&idle, SIM_DT);
            }
            stage.display_closed();
            cues.extend(stage.drain_cues());
        }

        // No fade-out: the futon stays around for the next throw
        assert!(stage.world.exists(futon));
        let shown = cues.iter().filter(|c| matches!(c, Cue::ShowPun { .. })).count();
        assert_eq!(shown, 2);
        assert_eq!(stage.director().score(), 2);
    }

    #[test]
    fn test_demo_bag_floats_until_weighted() {
        let scene = SceneSpec::demo().unwrap();
        let mut stage = scene.build(&Settings::default()).unwrap();
        let bag = stage.world.find("bag").unwrap();
        let weight = stage.world.find("weight").unwrap();
        let water = stage.world.find("water").unwrap();
        let water_pos = stage.world.body(water).unwrap().pos;

        // Drop the bag into the water
        stage.world.set_position(bag, water_pos);
        let input = StageInput::default();
        let mut floated = false;
        for _ in 0..(2.0 / SIM_DT) as usize {
            stage.tick(&input, SIM_DT);
            floated |= stage.gimmicks().iter().any(Gimmick::is_in_water);
        }
        assert!(floated);

        // Weight dropped on the bag is absorbed
        let bag_pos = stage.world.body(bag).unwrap().pos;
        stage.world.set_position(weight, bag_pos);
        stage.tick(&input, SIM_DT);
        assert!(!stage.world.exists(weight));
        assert!(stage.world.body(bag).unwrap().mass > 1.0);
    }
}
