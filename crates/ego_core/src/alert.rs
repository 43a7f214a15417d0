//! Alert flags raised by the simulation for scripts to observe.
//!
//! Bit positions are part of the compiled-script contract and must not move.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct AlertFlags: u32 {
        const SPAWNED        = 1 << 0;
        const HITVULNERABLE  = 1 << 1;
        const ATWAYPOINT     = 1 << 2;
        const ATLASTWAYPOINT = 1 << 3;
        const ATTACKED       = 1 << 4;
        const BUMPED         = 1 << 5;
        const ORDERED        = 1 << 6;
        const CALLEDFORHELP  = 1 << 7;
        const KILLED         = 1 << 8;
        const TARGETKILLED   = 1 << 9;
        const DROPPED        = 1 << 10;
        const GRABBED        = 1 << 11;
        const REAFFIRMED     = 1 << 12;
        const LEADERKILLED   = 1 << 13;
        const USED           = 1 << 14;
        const CLEANEDUP      = 1 << 15;
        const SCOREDAHIT     = 1 << 16;
        const HEALED         = 1 << 17;
        const DISAFFIRMED    = 1 << 18;
        const CHANGED        = 1 << 19;
        const INWATER        = 1 << 20;
        const BORED          = 1 << 21;
        const TOOMUCHBAGGAGE = 1 << 22;
        const GROGGED        = 1 << 23;
        const DAZED          = 1 << 24;
        const HITGROUND      = 1 << 25;
        const NOTDROPPED     = 1 << 26;
        const BLOCKED        = 1 << 27;
        const THROWN         = 1 << 28;
        const CRUSHED        = 1 << 29;
        const NOTPUTAWAY     = 1 << 30;
        const TAKENOUT       = 1 << 31;
        /// Shares its bit with `NOTPUTAWAY`: a kursed item refused to move.
        const NOTTAKENOUT    = 1 << 30;
    }
}

impl AlertFlags {
    /// Names in bit order, as accepted by the script compiler's constant table.
    pub const NAMES: [(&'static str, AlertFlags); 32] = [
        ("SPAWNED", Self::SPAWNED),
        ("HITVULNERABLE", Self::HITVULNERABLE),
        ("ATWAYPOINT", Self::ATWAYPOINT),
        ("ATLASTWAYPOINT", Self::ATLASTWAYPOINT),
        ("ATTACKED", Self::ATTACKED),
        ("BUMPED", Self::BUMPED),
        ("ORDERED", Self::ORDERED),
        ("CALLEDFORHELP", Self::CALLEDFORHELP),
        ("KILLED", Self::KILLED),
        ("TARGETKILLED", Self::TARGETKILLED),
        ("DROPPED", Self::DROPPED),
        ("GRABBED", Self::GRABBED),
        ("REAFFIRMED", Self::REAFFIRMED),
        ("LEADERKILLED", Self::LEADERKILLED),
        ("USED", Self::USED),
        ("CLEANEDUP", Self::CLEANEDUP),
        ("SCOREDAHIT", Self::SCOREDAHIT),
        ("HEALED", Self::HEALED),
        ("DISAFFIRMED", Self::DISAFFIRMED),
        ("CHANGED", Self::CHANGED),
        ("INWATER", Self::INWATER),
        ("BORED", Self::BORED),
        ("TOOMUCHBAGGAGE", Self::TOOMUCHBAGGAGE),
        ("GROGGED", Self::GROGGED),
        ("DAZED", Self::DAZED),
        ("HITGROUND", Self::HITGROUND),
        ("NOTDROPPED", Self::NOTDROPPED),
        ("BLOCKED", Self::BLOCKED),
        ("THROWN", Self::THROWN),
        ("CRUSHED", Self::CRUSHED),
        ("NOTPUTAWAY", Self::NOTPUTAWAY),
        ("TAKENOUT", Self::TAKENOUT),
    ];
}
