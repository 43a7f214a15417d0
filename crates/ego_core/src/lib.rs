//! Ego Engine Core
//!
//! Contains the canonical simulation state shared by physics and scripting:
//! - Generation-checked entity, particle and enchant arenas
//! - Entity, AI and stat data model with alert flags
//! - Deterministic time, fixed-point and facing math
//! - Terrain mesh, passages and shops
//! - Damage, healing, spawning, inventory and enchant operations

pub mod ai;
pub mod alert;
pub mod arena;
pub mod damage;
pub mod effect;
pub mod enchant;
pub mod entity;
pub mod handle;
pub mod inventory;
pub mod math;
pub mod mesh;
pub mod particle;
pub mod passage;
pub mod profile;
pub mod settings;
pub mod store;
pub mod team;
pub mod time;
pub mod world;

pub use glam;

pub use ai::{AiState, Registers, TurnMode, Waypoints};
pub use alert::AlertFlags;
pub use damage::{AttackQuadrant, DamageFlags, DamageModifier, DamageRange, DamageType};
pub use effect::{Audience, Effect, EffectQueue};
pub use enchant::{Enchant, EnchantDef, EnchantId, EnchantStore};
pub use entity::{Bumper, Entity, Hand, ItemProps, PhysicsProps, Stats};
pub use handle::{EnchantHandle, EntityHandle, ParticleHandle};
pub use inventory::{Inventory, InventoryAdd, InventoryError, INVENTORY_SLOTS};
pub use mesh::{TerrainMesh, Tile, TileFx, TILE_SIZE};
pub use particle::{Particle, ParticleDef, ParticleStore};
pub use passage::{Passage, PassageId, PassageList, TileRect};
pub use profile::{idsz, Idsz, Profile, ProfileId, ProfileRegistry, ScriptId};
pub use settings::{PhysicsSettings, ScriptSettings, SettingsError, SimSettings};
pub use store::EntityStore;
pub use team::{TeamId, TeamTable};
pub use world::World;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
