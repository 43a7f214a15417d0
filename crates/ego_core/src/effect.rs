//! Side effects handed to the surrounding shell
//!
//! Opcodes never block on audio, UI or the network. They push an [`Effect`]
//! and the shell drains the queue between ticks.

use crate::handle::EntityHandle;
use crate::math::Vec3;
use crate::team::TeamId;

/// Who receives a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Audience {
    Everyone,
    /// Players within `radius` of `center`.
    Near { center: Vec3, radius: f32 },
    Team(TeamId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    PlaySound {
        source: EntityHandle,
        sound: i32,
        pos: Vec3,
    },
    Message {
        from: EntityHandle,
        message: i32,
        audience: Audience,
    },
    Debug {
        from: EntityHandle,
        text: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EffectQueue {
    effects: Vec<Effect>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        tracing::trace!(?effect, "effect queued");
        self.effects.push(effect);
    }

    /// Hand every queued effect to the caller, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Effect> + '_ {
        self.effects.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
