//! Scenario files for the headless harness
//!
//! A scenario is a JSON document describing settings, terrain, profiles,
//! passages and initial spawns:
//!
//! ```json
//! {
//!   "settings": { "seed": 7 },
//!   "terrain": { "tiles_x": 16, "tiles_y": 16 },
//!   "script_dir": "scripts",
//!   "profiles": [{ "class_name": "Guard", "script_name": "guard", "team": 6 }],
//!   "spawns": [{ "profile": "Guard", "pos": [640.0, 640.0, 0.0] }],
//!   "ticks": 300
//! }
//! ```
//!
//! Missing fields take their defaults. `script_dir` is relative to the
//! scenario file.

use crate::simulation::Simulation;
use ego_core::glam::Vec3;
use ego_core::math::Facing;
use ego_core::{Passage, Profile, SimSettings, TeamId, TerrainMesh, TileRect, World};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error("profile `{profile}` uses unknown script `{script}`")]
    UnknownScript { profile: String, script: String },
    #[error("spawn {index} names unknown profile `{profile}`")]
    UnknownProfile { index: usize, profile: String },
    #[error("spawn {index}: `{team}` is not a team letter")]
    BadTeam { index: usize, team: char },
    #[error("spawn {index} of `{profile}` at {pos:?} failed")]
    SpawnFailed { index: usize, profile: String, pos: [f32; 3] },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSpec {
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub height: f32,
}

impl Default for TerrainSpec {
    fn default() -> Self {
        Self {
            tiles_x: 32,
            tiles_y: 32,
            height: 0.0,
        }
    }
}

/// A profile plus the name of the script it runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioProfile {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(default)]
    pub script_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioPassage {
    /// Inclusive tile rectangle `[x0, y0, x1, y1]`.
    pub tiles: [u32; 4],
    pub open: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioSpawn {
    /// Class name of a profile in this scenario.
    pub profile: String,
    pub pos: [f32; 3],
    /// Team letter; the profile's team when absent.
    pub team: Option<char>,
    pub facing: Facing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub settings: SimSettings,
    pub terrain: TerrainSpec,
    pub script_dir: Option<PathBuf>,
    pub profiles: Vec<ScenarioProfile>,
    pub passages: Vec<ScenarioPassage>,
    pub spawns: Vec<ScenarioSpawn>,
    pub ticks: u64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            settings: SimSettings::default(),
            terrain: TerrainSpec::default(),
            script_dir: None,
            profiles: Vec::new(),
            passages: Vec::new(),
            spawns: Vec::new(),
            ticks: 60,
        }
    }
}

impl Scenario {
    pub fn from_json_str(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Build a ready-to-tick simulation. `base` resolves `script_dir`.
    pub fn build(&self, base: &Path) -> Result<Simulation, ScenarioError> {
        let mesh = TerrainMesh::flat(self.terrain.tiles_x, self.terrain.tiles_y, self.terrain.height);
        let mut sim = Simulation::new(World::new(self.settings.clone(), mesh));

        if let Some(dir) = &self.script_dir {
            let dir = base.join(dir);
            sim.load_scripts(&dir)
                .map_err(|source| ScenarioError::Io { path: dir.clone(), source })?;
        }

        for entry in &self.profiles {
            let mut profile = entry.profile.clone();
            profile.script = match &entry.script_name {
                Some(name) => Some(sim.library.find(name).ok_or_else(|| ScenarioError::UnknownScript {
                    profile: profile.class_name.clone(),
                    script: name.clone(),
                })?),
                None => None,
            };
            sim.world.profiles.register(profile);
        }

        for passage in &self.passages {
            let [x0, y0, x1, y1] = passage.tiles;
            let passage = Passage::new(TileRect::new(x0, y0, x1, y1), passage.open);
            sim.world.passages.add(passage, &mut sim.world.mesh);
        }

        for (index, spawn) in self.spawns.iter().enumerate() {
            let profile = sim
                .world
                .profiles
                .find_by_class(&spawn.profile)
                .ok_or_else(|| ScenarioError::UnknownProfile {
                    index,
                    profile: spawn.profile.clone(),
                })?;
            let team = spawn
                .team
                .map(|letter| TeamId::from_letter(letter).ok_or(ScenarioError::BadTeam { index, team: letter }))
                .transpose()?;
            let pos = Vec3::from_array(spawn.pos);
            sim.world
                .spawn(profile, pos, team, 0, spawn.facing)
                .ok_or_else(|| ScenarioError::SpawnFailed {
                    index,
                    profile: spawn.profile.clone(),
                    pos: spawn.pos,
                })?;
        }

        info!(
            profiles = sim.world.profiles.len(),
            entities = sim.world.entities.len(),
            scripts = sim.library.len(),
            "scenario built"
        );
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARENA: &str = r#"{
        "settings": { "seed": 7 },
        "terrain": { "tiles_x": 8, "tiles_y": 8 },
        "profiles": [{ "class_name": "Pillar", "platform": true }],
        "passages": [{ "tiles": [2, 2, 3, 3], "open": true }],
        "spawns": [
            { "profile": "Pillar", "pos": [300.0, 300.0, 0.0], "team": "G" },
            { "profile": "Pillar", "pos": [600.0, 300.0, 0.0] }
        ]
    }"#;

    #[test]
    fn builds_world_from_json() {
        let scenario = Scenario::from_json_str(ARENA).expect("valid scenario");
        assert_eq!(scenario.ticks, 60);
        let sim = scenario.build(Path::new(".")).expect("builds");
        assert_eq!(sim.world.settings.seed, 7);
        assert_eq!(sim.world.mesh.tiles_x(), 8);
        assert_eq!(sim.world.entities.len(), 2);
        assert_eq!(sim.world.passages.len(), 1);
        let (_, first) = sim.world.entities.iter().next().expect("first");
        assert_eq!(first.team, TeamId::GOOD);
        assert!(first.phys.platform);
    }

    #[test]
    fn unknown_names_are_errors() {
        let scenario = Scenario::from_json_str(
            r#"{ "profiles": [{ "class_name": "Guard", "script_name": "guard" }] }"#,
        )
        .expect("valid scenario");
        assert!(matches!(
            scenario.build(Path::new(".")),
            Err(ScenarioError::UnknownScript { .. })
        ));

        let scenario =
            Scenario::from_json_str(r#"{ "spawns": [{ "profile": "Ghost" }] }"#).expect("valid scenario");
        assert!(matches!(
            scenario.build(Path::new(".")),
            Err(ScenarioError::UnknownProfile { index: 0, .. })
        ));
    }
}
