//! Per-run handler context

use ego_core::glam::Vec3;
use ego_core::math::{facing_from_vec, Facing};
use ego_core::{Entity, EntityHandle, Registers, World};

/// Everything a handler may touch while one entity's script runs.
///
/// `regs` is a working copy of the entity's registers; the engine writes it
/// back when the run ends.
pub struct ScriptContext<'w> {
    pub world: &'w mut World,
    pub me: EntityHandle,
    pub regs: Registers,
    /// Set by `End` to stop the run after the current instruction.
    pub terminate: bool,
}

impl<'w> ScriptContext<'w> {
    pub fn new(world: &'w mut World, me: EntityHandle, regs: Registers) -> Self {
        Self {
            world,
            me,
            regs,
            terminate: false,
        }
    }

    pub fn me(&self) -> Option<&Entity> {
        self.world.entities.get(self.me)
    }

    pub fn me_mut(&mut self) -> Option<&mut Entity> {
        self.world.entities.get_mut(self.me)
    }

    /// Current target, if it still refers to a stored entity.
    pub fn target(&self) -> Option<EntityHandle> {
        self.me()?.ai.target.filter(|target| self.world.exists(*target))
    }

    pub fn target_entity(&self) -> Option<&Entity> {
        self.world.get(self.target()?)
    }

    pub fn target_entity_mut(&mut self) -> Option<&mut Entity> {
        let target = self.target()?;
        self.world.get_mut(target)
    }

    /// Point the target at `target`; fails (and keeps the old target) when
    /// there is nothing to point at.
    pub fn retarget(&mut self, target: Option<EntityHandle>) -> bool {
        let Some(target) = target.filter(|target| self.world.exists(*target)) else {
            return false;
        };
        match self.me_mut() {
            Some(me) => {
                me.ai.set_target(Some(target));
                true
            }
            None => false,
        }
    }

    /// The entity `me` is held by or packed in, if any.
    pub fn holder(&self) -> Option<EntityHandle> {
        let me = self.me()?;
        me.attached_to.or(me.in_pack_of)
    }

    pub fn pos(&self, handle: EntityHandle) -> Option<Vec3> {
        self.world.get(handle).map(|entity| entity.pos)
    }

    /// Facing from `me` toward `handle`.
    pub fn turn_to(&self, handle: EntityHandle) -> Option<Facing> {
        let from = self.pos(self.me)?;
        let to = self.pos(handle)?;
        Some(facing_from_vec(to.x - from.x, to.y - from.y))
    }

    /// Horizontal distance from `me` to `handle`, rounded down.
    pub fn distance_to(&self, handle: EntityHandle) -> Option<i32> {
        self.world.distance(self.me, handle).map(|distance| distance as i32)
    }

    /// Registers as an `(x, y)` point at `me`'s height.
    pub fn xy(&self) -> Vec3 {
        let z = self.pos(self.me).map_or(0.0, |pos| pos.z);
        Vec3::new(self.regs.x as f32, self.regs.y as f32, z)
    }
}
