//! Read-only values available to assignments
//!
//! Variable indices are stored in compiled scripts, so entries may only be
//! appended.

use crate::context::ScriptContext;
use ego_core::glam::Vec2;
use ego_core::math::facing_from_vec;
use ego_core::{Entity, EntityHandle};

macro_rules! define_variables {
    ($($variant:ident => $name:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Variable {
            $($variant,)*
        }

        impl Variable {
            pub const ALL: &'static [Variable] = &[$(Variable::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Variable::$variant => $name,)*
                }
            }
        }
    };
}

define_variables! {
    X => "x",
    Y => "y",
    Turn => "turn",
    Distance => "distance",
    Argument => "argument",
    Rand => "rand",
    SelfX => "self_x",
    SelfY => "self_y",
    SelfZ => "self_z",
    SelfTurn => "self_turn",
    SelfCounter => "self_counter",
    SelfOrder => "self_order",
    SelfMorale => "self_morale",
    SelfLife => "self_life",
    SelfLifeMax => "self_life_max",
    SelfMana => "self_mana",
    SelfManaMax => "self_mana_max",
    SelfStrength => "self_strength",
    SelfWisdom => "self_wisdom",
    SelfIntelligence => "self_intelligence",
    SelfDexterity => "self_dexterity",
    SelfMoney => "self_money",
    SelfExperience => "self_experience",
    SelfLevel => "self_level",
    SelfState => "self_state",
    SelfContent => "self_content",
    SelfTimer => "self_timer",
    SelfAmmo => "self_ammo",
    SelfTeam => "self_team",
    SelfSpeed => "self_speed",
    SelfSpawnX => "self_spawn_x",
    SelfSpawnY => "self_spawn_y",
    SelfWaypoints => "self_waypoints",
    SelfAttackTurn => "self_attack_turn",
    TargetX => "target_x",
    TargetY => "target_y",
    TargetZ => "target_z",
    TargetTurn => "target_turn",
    TargetDistance => "target_distance",
    TargetTurnTo => "target_turn_to",
    TargetLife => "target_life",
    TargetLifeMax => "target_life_max",
    TargetMana => "target_mana",
    TargetMoney => "target_money",
    TargetTeam => "target_team",
    TargetState => "target_state",
    TargetContent => "target_content",
    TargetSpeed => "target_speed",
    TargetLevel => "target_level",
    OwnerX => "owner_x",
    OwnerY => "owner_y",
    OwnerTurn => "owner_turn",
    OwnerDistance => "owner_distance",
    OwnerTurnTo => "owner_turn_to",
    LeaderX => "leader_x",
    LeaderY => "leader_y",
    LeaderDistance => "leader_distance",
    XyDistance => "xy_distance",
    XyTurnTo => "xy_turn_to",
}

impl Variable {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u32) -> Option<Variable> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn from_name(name: &str) -> Option<Variable> {
        Self::ALL.iter().copied().find(|variable| variable.name() == name)
    }

    /// Current value. Missing target, owner or leader reads as 0.
    pub fn read(self, ctx: &mut ScriptContext<'_>) -> i32 {
        let regs = ctx.regs;
        match self {
            Variable::X => regs.x,
            Variable::Y => regs.y,
            Variable::Turn => regs.turn,
            Variable::Distance => regs.distance,
            Variable::Argument => regs.argument,
            Variable::Rand => ctx.world.rng.next_u16() as i32,
            Variable::SelfMorale => ctx.me().map_or(0, |me| ctx.world.teams.morale(me.team)),
            Variable::XyDistance => {
                let Some(me) = ctx.me() else { return 0 };
                me.pos.truncate().distance(Vec2::new(regs.x as f32, regs.y as f32)) as i32
            }
            Variable::XyTurnTo => {
                let Some(me) = ctx.me() else { return 0 };
                facing_from_vec(regs.x as f32 - me.pos.x, regs.y as f32 - me.pos.y) as i32
            }
            Variable::TargetDistance => ctx.target().and_then(|target| ctx.distance_to(target)).unwrap_or(0),
            Variable::TargetTurnTo => ctx.target().and_then(|target| ctx.turn_to(target)).map_or(0, i32::from),
            Variable::OwnerDistance => owner(ctx).and_then(|owner| ctx.distance_to(owner)).unwrap_or(0),
            Variable::OwnerTurnTo => owner(ctx).and_then(|owner| ctx.turn_to(owner)).map_or(0, i32::from),
            Variable::LeaderDistance => leader(ctx).and_then(|leader| ctx.distance_to(leader)).unwrap_or(0),
            Variable::TargetX
            | Variable::TargetY
            | Variable::TargetZ
            | Variable::TargetTurn
            | Variable::TargetLife
            | Variable::TargetLifeMax
            | Variable::TargetMana
            | Variable::TargetMoney
            | Variable::TargetTeam
            | Variable::TargetState
            | Variable::TargetContent
            | Variable::TargetSpeed
            | Variable::TargetLevel => ctx.target_entity().map_or(0, |target| entity_field(self, target)),
            Variable::OwnerX | Variable::OwnerY | Variable::OwnerTurn => owner(ctx)
                .and_then(|owner| ctx.world.get(owner))
                .map_or(0, |owner| entity_field(self, owner)),
            Variable::LeaderX | Variable::LeaderY => leader(ctx)
                .and_then(|leader| ctx.world.get(leader))
                .map_or(0, |leader| entity_field(self, leader)),
            _ => ctx.me().map_or(0, |me| entity_field(self, me)),
        }
    }
}

fn owner(ctx: &ScriptContext<'_>) -> Option<EntityHandle> {
    ctx.me()?.ai.owner.filter(|owner| ctx.world.exists(*owner))
}

fn leader(ctx: &ScriptContext<'_>) -> Option<EntityHandle> {
    let team = ctx.me()?.team;
    ctx.world.teams.leader(team).filter(|leader| ctx.world.exists(*leader))
}

/// Fields read straight off one entity.
fn entity_field(variable: Variable, entity: &Entity) -> i32 {
    match variable {
        Variable::SelfX | Variable::TargetX | Variable::OwnerX | Variable::LeaderX => entity.pos.x as i32,
        Variable::SelfY | Variable::TargetY | Variable::OwnerY | Variable::LeaderY => entity.pos.y as i32,
        Variable::SelfZ | Variable::TargetZ => entity.pos.z as i32,
        Variable::SelfTurn | Variable::TargetTurn | Variable::OwnerTurn => entity.facing as i32,
        Variable::SelfCounter => entity.ai.order_counter,
        Variable::SelfOrder => entity.ai.order_value,
        Variable::SelfLife | Variable::TargetLife => entity.stats.life,
        Variable::SelfLifeMax | Variable::TargetLifeMax => entity.stats.life_max,
        Variable::SelfMana | Variable::TargetMana => entity.stats.mana,
        Variable::SelfManaMax => entity.stats.mana_max,
        Variable::SelfStrength => entity.stats.strength,
        Variable::SelfWisdom => entity.stats.wisdom,
        Variable::SelfIntelligence => entity.stats.intelligence,
        Variable::SelfDexterity => entity.stats.dexterity,
        Variable::SelfMoney | Variable::TargetMoney => entity.stats.money,
        Variable::SelfExperience => entity.stats.experience,
        Variable::SelfLevel | Variable::TargetLevel => entity.stats.level,
        Variable::SelfState | Variable::TargetState => entity.ai.state,
        Variable::SelfContent | Variable::TargetContent => entity.ai.content,
        Variable::SelfTimer => entity.ai.timer,
        Variable::SelfAmmo => entity.item.ammo,
        Variable::SelfTeam | Variable::TargetTeam => entity.team.0 as i32,
        Variable::SelfSpeed | Variable::TargetSpeed => entity.vel.truncate().length() as i32,
        Variable::SelfSpawnX => entity.spawn_pos.x as i32,
        Variable::SelfSpawnY => entity.spawn_pos.y as i32,
        Variable::SelfWaypoints => entity.ai.waypoints.remaining() as i32,
        Variable::SelfAttackTurn => entity.ai.direction_last as i32,
        _ => 0,
    }
}
