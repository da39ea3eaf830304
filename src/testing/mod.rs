//! Deterministic stand-ins for the sensor and the clock.
//!
//! Both types are cheap handles over shared state, so a test (or the
//! simulation binary) can keep one clone while the detector owns another and
//! still queue readings or move time forward between `update()` calls.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::hal::{Clock, RangeSource};

/// Clock whose time only moves when told to, or when something sleeps on it.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
    slept: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
            slept: Rc::new(Cell::new(0)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    /// Total milliseconds spent in `sleep_ms`.
    pub fn total_slept(&self) -> u64 {
        self.slept.get()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u64) {
        self.slept.set(self.slept.get() + ms);
        self.advance(ms);
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    pending: VecDeque<i64>,
    last: i64,
    reads: u64,
}

/// Range source that replays queued readings.
///
/// Once the queue drains the last reading repeats, which models a sensor
/// staring at an unchanged scene.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRange {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedRange {
    pub fn new<I: IntoIterator<Item = i64>>(readings: I) -> Self {
        let source = Self::default();
        source.push_all(readings);
        source
    }

    /// Source that always reports `value`.
    pub fn constant(value: i64) -> Self {
        let source = Self::default();
        source.state.borrow_mut().last = value;
        source
    }

    pub fn push(&self, reading: i64) {
        self.state.borrow_mut().pending.push_back(reading);
    }

    pub fn push_all<I: IntoIterator<Item = i64>>(&self, readings: I) {
        self.state.borrow_mut().pending.extend(readings);
    }

    /// Number of readings handed out so far.
    pub fn reads(&self) -> u64 {
        self.state.borrow().reads
    }

    pub fn remaining(&self) -> usize {
        self.state.borrow().pending.len()
    }
}

impl RangeSource for ScriptedRange {
    fn read_range(&mut self) -> i64 {
        let mut state = self.state.borrow_mut();
        state.reads += 1;
        if let Some(next) = state.pending.pop_front() {
            state.last = next;
        }
        state.last
    }
}
