//! Generation-indexed handles
//!
//! Handles are lightweight (8 bytes) references into the arenas. The
//! generation counter is bumped whenever a slot is freed, so a stale handle
//! reads as "not found" instead of aliasing whatever reuses the slot.
//!
//! Format: [32-bit index | 32-bit generation]

/// Common surface of every arena handle.
pub trait ArenaHandle: Copy + Eq + std::fmt::Debug {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(&self) -> u32;
    fn generation(&self) -> u32;
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl $name {
            pub(crate) const fn new(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            pub fn index(&self) -> u32 {
                self.index
            }

            pub fn generation(&self) -> u32 {
                self.generation
            }

            /// Serialize to 64-bit integer (for save files and logs)
            pub fn to_bits(&self) -> u64 {
                ((self.generation as u64) << 32) | (self.index as u64)
            }

            /// Deserialize from 64-bit integer
            pub fn from_bits(bits: u64) -> Self {
                Self {
                    index: bits as u32,
                    generation: (bits >> 32) as u32,
                }
            }
        }

        impl ArenaHandle for $name {
            fn from_parts(index: u32, generation: u32) -> Self {
                Self::new(index, generation)
            }

            fn index(&self) -> u32 {
                self.index
            }

            fn generation(&self) -> u32 {
                self.generation
            }
        }
    };
}

define_handle!(
    /// Reference to a character, item or other scripted game object.
    EntityHandle
);
define_handle!(
    /// Reference to a particle.
    ParticleHandle
);
define_handle!(
    /// Reference to an active enchantment.
    EnchantHandle
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_round_trip() {
        let handle = EntityHandle::new(17, 3);
        assert_eq!(EntityHandle::from_bits(handle.to_bits()), handle);
    }

    #[test]
    fn ordering_is_index_first() {
        let low = EntityHandle::new(1, 9);
        let high = EntityHandle::new(2, 0);
        assert!(low < high);
    }
}
