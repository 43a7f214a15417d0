//! Ego Engine Physics
//!
//! Collision detection and response for the simulation world:
//! - Octagonal bounding volumes and swept interval tests
//! - Terrain partition rebuilt from the mesh revision
//! - Per-tick dynamic index over moving entities
//! - Canonical pair lists, platform snapping, contact and particle damage
//! - Steering, integration and particle movement

pub mod bsp;
pub mod detect;
pub mod index;
pub mod motion;
pub mod octbox;
pub mod pair;
pub mod resolve;

pub use bsp::{BlockingTile, TerrainBsp};
pub use detect::{CollisionDetector, DetectStats};
pub use index::DynamicIndex;
pub use octbox::OctBox;
pub use pair::{CollisionPair, PairKind, Participant};
pub use resolve::{CollisionResolver, ResolveStats};
