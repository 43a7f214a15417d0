//! Tick phases, in execution order

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickPhase {
    BeginTick = 0,
    Steer = 1,
    Detect = 2,
    Resolve = 3,
    Integrate = 4,
    Particles = 5,
    Scripts = 6,
}

impl TickPhase {
    pub const COUNT: usize = 7;

    pub const ALL: [TickPhase; Self::COUNT] = [
        TickPhase::BeginTick,
        TickPhase::Steer,
        TickPhase::Detect,
        TickPhase::Resolve,
        TickPhase::Integrate,
        TickPhase::Particles,
        TickPhase::Scripts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TickPhase::BeginTick => "begin_tick",
            TickPhase::Steer => "steer",
            TickPhase::Detect => "detect",
            TickPhase::Resolve => "resolve",
            TickPhase::Integrate => "integrate",
            TickPhase::Particles => "particles",
            TickPhase::Scripts => "scripts",
        }
    }
}

/// Events counted per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickCounter {
    PairsFound = 0,
    PairsResolved = 1,
    ScriptsRun = 2,
    Opcodes = 3,
    Reaped = 4,
}

impl TickCounter {
    pub const COUNT: usize = 5;

    pub const ALL: [TickCounter; Self::COUNT] = [
        TickCounter::PairsFound,
        TickCounter::PairsResolved,
        TickCounter::ScriptsRun,
        TickCounter::Opcodes,
        TickCounter::Reaped,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TickCounter::PairsFound => "pairs_found",
            TickCounter::PairsResolved => "pairs_resolved",
            TickCounter::ScriptsRun => "scripts_run",
            TickCounter::Opcodes => "opcodes",
            TickCounter::Reaped => "reaped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_index_all() {
        for (index, phase) in TickPhase::ALL.iter().enumerate() {
            assert_eq!(*phase as usize, index);
        }
        for (index, counter) in TickCounter::ALL.iter().enumerate() {
            assert_eq!(*counter as usize, index);
        }
    }
}
