//! Per-entity scripting context

use crate::alert::AlertFlags;
use crate::damage::DamageType;
use crate::handle::{EnchantHandle, EntityHandle};
use crate::math::{Facing, Vec2};

/// Maximum queued waypoints per entity.
pub const MAX_WAYPOINTS: usize = 8;

/// Scratch registers shared by every opcode of one script run.
///
/// They are never reset between runs; only assignments and opcodes that
/// write them change their values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub x: i32,
    pub y: i32,
    pub turn: i32,
    pub distance: i32,
    pub argument: i32,
}

/// How the entity chooses its facing each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnMode {
    /// Face the direction of travel.
    #[default]
    Velocity,
    /// Keep the current facing.
    Watch,
    /// Face the current target.
    WatchTarget,
    /// Rotate continuously.
    Spin,
}

/// Ordered list of 2D points the entity walks toward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waypoints {
    points: Vec<Vec2>,
    head: usize,
}

impl Waypoints {
    /// Append a waypoint; fails once the list is full.
    pub fn push(&mut self, point: Vec2) -> bool {
        if self.head > 0 {
            self.points.drain(..self.head);
            self.head = 0;
        }
        if self.points.len() >= MAX_WAYPOINTS {
            return false;
        }
        self.points.push(point);
        true
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.head = 0;
    }

    /// Waypoint currently being walked toward.
    pub fn current(&self) -> Option<Vec2> {
        self.points.get(self.head).copied()
    }

    /// Mark the current waypoint reached; returns true if it was the last one.
    pub fn advance(&mut self) -> bool {
        if self.head < self.points.len() {
            self.head += 1;
        }
        self.head >= self.points.len()
    }

    pub fn remaining(&self) -> usize {
        self.points.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Lazy view of the pending points.
    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.points[self.head..].iter().copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AiState {
    pub target: Option<EntityHandle>,
    pub old_target: Option<EntityHandle>,
    pub owner: Option<EntityHandle>,
    /// Last entity spawned by this entity's script.
    pub child: Option<EntityHandle>,
    pub alert: AlertFlags,
    /// Persistent script scratch values.
    pub content: i32,
    pub state: i32,
    pub waypoints: Waypoints,
    /// Countdown in ticks; `IfTimeOut` fires at zero.
    pub timer: i32,
    pub registers: Registers,
    pub bump_last: Option<EntityHandle>,
    pub attack_last: Option<EntityHandle>,
    pub hit_last: Option<EntityHandle>,
    /// Attack direction relative to facing of the last damage taken.
    pub direction_last: Facing,
    pub damage_type_last: DamageType,
    /// Type dealt by the entity's own scripted attacks.
    pub damage_type: DamageType,
    /// Most recent enchant this entity cast.
    pub last_enchant: Option<EnchantHandle>,
    pub order_value: i32,
    pub order_counter: i32,
    pub turn_mode: TurnMode,
    /// Set after the entity's first script run; alert clearing waits for it.
    pub has_run: bool,
}

impl AiState {
    pub fn raise(&mut self, flags: AlertFlags) {
        self.alert |= flags;
    }

    pub fn is_alerted(&self, flags: AlertFlags) -> bool {
        self.alert.contains(flags)
    }

    /// Retarget, remembering the previous target.
    pub fn set_target(&mut self, target: Option<EntityHandle>) {
        if self.target != target {
            self.old_target = self.target;
        }
        self.target = target;
    }
}
