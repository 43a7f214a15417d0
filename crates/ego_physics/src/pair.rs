//! Collision pairs

use crate::octbox::AXES;
use ego_core::{EntityHandle, ParticleHandle};

/// The second participant of a pair. The first is always an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Participant {
    Entity(EntityHandle),
    Particle(ParticleHandle),
    Tile { tx: u32, ty: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    EntityEntity,
    EntityParticle,
    EntityTile,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPair {
    pub a: EntityHandle,
    pub b: Participant,
    /// Fraction of the tick at which the volumes start to overlap.
    pub tmin: f32,
    /// Fraction of the tick at which they separate again (clamped to 1).
    pub tmax: f32,
    /// Per-axis overlap of the volumes at `tmin`.
    pub overlap: [f32; AXES],
    /// Set when `a` and `b` are a rider and the platform it stands on;
    /// holds the platform's handle.
    pub platform: Option<EntityHandle>,
}

impl CollisionPair {
    /// Entity pair with the lower handle first.
    pub fn entities(a: EntityHandle, b: EntityHandle, tmin: f32, tmax: f32, overlap: [f32; AXES]) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            a: first,
            b: Participant::Entity(second),
            tmin,
            tmax,
            overlap,
            platform: None,
        }
    }

    pub fn kind(&self) -> PairKind {
        match self.b {
            Participant::Entity(_) => PairKind::EntityEntity,
            Participant::Particle(_) => PairKind::EntityParticle,
            Participant::Tile { .. } => PairKind::EntityTile,
        }
    }

    /// Identity used to drop duplicates.
    pub fn key(&self) -> (EntityHandle, Participant) {
        (self.a, self.b)
    }

    pub fn involves(&self, entity: EntityHandle) -> bool {
        self.a == entity || self.b == Participant::Entity(entity)
    }

    /// The entity opposite `entity` in an entity pair.
    pub fn other(&self, entity: EntityHandle) -> Option<EntityHandle> {
        match self.b {
            Participant::Entity(b) if self.a == entity => Some(b),
            Participant::Entity(b) if b == entity => Some(self.a),
            _ => None,
        }
    }
}

/// Sort pairs into canonical order and drop duplicates. When the same two
/// participants were found twice the earliest contact wins.
pub fn canonicalize(pairs: &mut Vec<CollisionPair>) {
    pairs.sort_by(|x, y| {
        x.key()
            .cmp(&y.key())
            .then_with(|| x.tmin.total_cmp(&y.tmin))
            .then_with(|| y.platform.is_some().cmp(&x.platform.is_some()))
    });
    pairs.dedup_by(|later, earlier| later.key() == earlier.key());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(index: u64) -> EntityHandle {
        EntityHandle::from_bits(index)
    }

    #[test]
    fn entity_pairs_are_ordered() {
        let pair = CollisionPair::entities(handle(5), handle(2), 0.0, 1.0, [0.0; AXES]);
        assert_eq!(pair.a, handle(2));
        assert_eq!(pair.b, Participant::Entity(handle(5)));
        assert_eq!(pair.other(handle(2)), Some(handle(5)));
        assert_eq!(pair.kind(), PairKind::EntityEntity);
    }

    #[test]
    fn duplicates_collapse_to_earliest() {
        let mut pairs = vec![
            CollisionPair::entities(handle(1), handle(3), 0.6, 1.0, [0.0; AXES]),
            CollisionPair::entities(handle(3), handle(1), 0.2, 1.0, [0.0; AXES]),
            CollisionPair::entities(handle(0), handle(1), 0.9, 1.0, [0.0; AXES]),
        ];
        canonicalize(&mut pairs);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].a, handle(0));
        assert!((pairs[1].tmin - 0.2).abs() < f32::EPSILON);
    }
}
