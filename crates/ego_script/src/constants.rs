//! Named constants accepted in script expressions

use ego_core::damage::{ATK_BEHIND, ATK_FRONT, ATK_LEFT, ATK_RIGHT};
use ego_core::math::{FACE_EAST, FACE_NORTH, FACE_SOUTH, FACE_WEST};
use ego_core::{AlertFlags, DamageType, Hand, TeamId};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static CONSTANTS: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for damage_type in DamageType::ALL {
        table.insert(format!("DAMAGE_{}", damage_type.name()), damage_type as i32);
    }
    for (name, value) in [
        ("ATK_FRONT", ATK_FRONT),
        ("ATK_RIGHT", ATK_RIGHT),
        ("ATK_BEHIND", ATK_BEHIND),
        ("ATK_LEFT", ATK_LEFT),
        ("FACE_NORTH", FACE_NORTH),
        ("FACE_EAST", FACE_EAST),
        ("FACE_SOUTH", FACE_SOUTH),
        ("FACE_WEST", FACE_WEST),
    ] {
        table.insert(name.to_string(), value as i32);
    }
    table.insert("HAND_LEFT".to_string(), Hand::Left as i32);
    table.insert("HAND_RIGHT".to_string(), Hand::Right as i32);
    for (name, team) in [
        ("TEAM_EVIL", TeamId::EVIL),
        ("TEAM_GOOD", TeamId::GOOD),
        ("TEAM_NULL", TeamId::NULL),
        ("TEAM_DAMAGE", TeamId::DAMAGE),
    ] {
        table.insert(name.to_string(), team.0 as i32);
    }
    // Alerts are named by bit index so every flag fits in an operand.
    for (name, flag) in AlertFlags::NAMES {
        table.insert(format!("ALERT_{name}"), flag.bits().trailing_zeros() as i32);
    }
    table.insert(
        "ALERT_NOTTAKENOUT".to_string(),
        AlertFlags::NOTTAKENOUT.bits().trailing_zeros() as i32,
    );
    table
});

/// Value of a named constant.
pub fn lookup(name: &str) -> Option<i32> {
    CONSTANTS.get(name).copied()
}
