//! Teams, hostility and leaders

use crate::handle::EntityHandle;
use serde::{Deserialize, Serialize};

pub const TEAM_COUNT: usize = 26;

/// Team letter index (A = 0 .. Z = 25).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl TeamId {
    pub const EVIL: TeamId = TeamId(b'E' - b'A');
    pub const GOOD: TeamId = TeamId(b'G' - b'A');
    /// Neutral team: hates nobody and is hated by nobody.
    pub const NULL: TeamId = TeamId(b'N' - b'A');
    /// Hostile to everyone, used by traps and environmental damage.
    pub const DAMAGE: TeamId = TeamId(b'Z' - b'A');

    pub fn from_letter(letter: char) -> Option<TeamId> {
        let upper = letter.to_ascii_uppercase();
        upper
            .is_ascii_uppercase()
            .then(|| TeamId(upper as u8 - b'A'))
    }

    /// Clamp arbitrary script values into the team range.
    pub fn from_i32(value: i32) -> TeamId {
        TeamId(value.rem_euclid(TEAM_COUNT as i32) as u8)
    }

    fn slot(self) -> usize {
        (self.0 as usize).min(TEAM_COUNT - 1)
    }
}

impl Default for TeamId {
    fn default() -> Self {
        TeamId::NULL
    }
}

/// Per-team relationships and bookkeeping.
#[derive(Debug, Clone)]
pub struct TeamTable {
    hates: [[bool; TEAM_COUNT]; TEAM_COUNT],
    leaders: [Option<EntityHandle>; TEAM_COUNT],
    morale: [i32; TEAM_COUNT],
}

impl TeamTable {
    pub fn new() -> Self {
        let mut hates = [[false; TEAM_COUNT]; TEAM_COUNT];
        for (a, row) in hates.iter_mut().enumerate() {
            for (b, cell) in row.iter_mut().enumerate() {
                let neutral = a == TeamId::NULL.slot() || b == TeamId::NULL.slot();
                *cell = a != b && !neutral;
            }
        }
        let damage = TeamId::DAMAGE.slot();
        for b in 0..TEAM_COUNT {
            hates[damage][b] = true;
        }
        Self {
            hates,
            leaders: [None; TEAM_COUNT],
            morale: [0; TEAM_COUNT],
        }
    }

    pub fn hates(&self, team: TeamId, other: TeamId) -> bool {
        self.hates[team.slot()][other.slot()]
    }

    pub fn set_hates(&mut self, team: TeamId, other: TeamId, hates: bool) {
        self.hates[team.slot()][other.slot()] = hates;
    }

    pub fn leader(&self, team: TeamId) -> Option<EntityHandle> {
        self.leaders[team.slot()]
    }

    pub fn set_leader(&mut self, team: TeamId, leader: Option<EntityHandle>) {
        self.leaders[team.slot()] = leader;
    }

    pub fn morale(&self, team: TeamId) -> i32 {
        self.morale[team.slot()]
    }

    pub fn add_morale(&mut self, team: TeamId, delta: i32) {
        let slot = team.slot();
        self.morale[slot] = self.morale[slot].saturating_add(delta).max(0);
    }

    /// Forget any leader that matches `handle`; returns the teams it led.
    pub fn forget_leader(&mut self, handle: EntityHandle) -> Vec<TeamId> {
        let mut led = Vec::new();
        for (index, leader) in self.leaders.iter_mut().enumerate() {
            if *leader == Some(handle) {
                *leader = None;
                led.push(TeamId(index as u8));
            }
        }
        led
    }
}

impl Default for TeamTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_relationships() {
        let teams = TeamTable::new();
        assert!(teams.hates(TeamId::GOOD, TeamId::EVIL));
        assert!(!teams.hates(TeamId::GOOD, TeamId::GOOD));
        assert!(!teams.hates(TeamId::NULL, TeamId::EVIL));
        assert!(!teams.hates(TeamId::EVIL, TeamId::NULL));
        assert!(teams.hates(TeamId::DAMAGE, TeamId::NULL));
    }

    #[test]
    fn team_letters() {
        assert_eq!(TeamId::from_letter('g'), Some(TeamId::GOOD));
        assert_eq!(TeamId::from_letter('?'), None);
        assert_eq!(TeamId::from_i32(-1), TeamId(25));
    }
}
