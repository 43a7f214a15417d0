//! Per-tick event counters with a rolling history

use crate::phase::TickCounter;
use crate::ring_buffer::RingBuffer;

pub struct TickCounters {
    current: [usize; TickCounter::COUNT],
    totals: [u64; TickCounter::COUNT],
    history: Vec<RingBuffer<usize>>,
}

impl TickCounters {
    pub fn new(window: usize) -> Self {
        Self {
            current: [0; TickCounter::COUNT],
            totals: [0; TickCounter::COUNT],
            history: (0..TickCounter::COUNT).map(|_| RingBuffer::new(window)).collect(),
        }
    }

    pub fn add(&mut self, counter: TickCounter, value: usize) {
        self.current[counter as usize] += value;
        self.totals[counter as usize] += value as u64;
    }

    /// Count for the tick in progress.
    pub fn get(&self, counter: TickCounter) -> usize {
        self.current[counter as usize]
    }

    pub fn total(&self, counter: TickCounter) -> u64 {
        self.totals[counter as usize]
    }

    pub fn average(&self, counter: TickCounter) -> f64 {
        self.history[counter as usize].average()
    }

    /// Close the current tick: push its counts into the history and start
    /// again from zero.
    pub fn end_tick(&mut self) {
        for (history, count) in self.history.iter_mut().zip(self.current.iter_mut()) {
            history.push(*count);
            *count = 0;
        }
    }
}

impl Default for TickCounters {
    fn default() -> Self {
        Self::new(60)
    }
}
