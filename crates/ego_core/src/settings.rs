//! Simulation settings

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default vertical tolerance for standing on a platform.
pub const PLATTOLERANCE: f32 = 50.0;

/// Cap applied to every money total.
pub const MAXMONEY: i32 = 9999;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub seed: u64,
    pub physics: PhysicsSettings,
    pub script: ScriptSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Vertical acceleration per tick.
    pub gravity: f32,
    /// Horizontal velocity retained per tick while airborne.
    pub air_friction: f32,
    /// Horizontal velocity retained per tick while grounded.
    pub ground_friction: f32,
    pub platform_tolerance: f32,
    /// Smallest extent used for degenerate bumpers and masses.
    pub min_extent: f32,
    /// Cell edge of the per-tick dynamic index.
    pub index_cell_size: f32,
    /// Maximum tiles per side of a terrain BSP leaf.
    pub bsp_leaf_tiles: u32,
    /// Damage (8.8) dealt to an entity caught in a closing passage.
    pub crush_damage: i32,
    /// Distance at which a waypoint counts as reached.
    pub waypoint_radius: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Spaces per indentation level in script source.
    pub indent_width: usize,
    pub max_money: i32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            physics: PhysicsSettings::default(),
            script: ScriptSettings::default(),
        }
    }
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: -1.0,
            air_friction: 0.95,
            ground_friction: 0.8,
            platform_tolerance: PLATTOLERANCE,
            min_extent: 0.001,
            index_cell_size: 256.0,
            bsp_leaf_tiles: 4,
            crush_damage: 8 << 8,
            waypoint_radius: 32.0,
        }
    }
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            indent_width: 2,
            max_money: MAXMONEY,
        }
    }
}

impl SimSettings {
    pub fn from_json_str(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
