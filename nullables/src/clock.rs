//! Nullable clock: logical time that only moves when told to.

use concord_types::{Clock, Timestamp};
use std::cell::Cell;
use std::rc::Rc;

/// A deterministic clock for testing.
///
/// Clones share the same underlying time, so a test can hand one clone to
/// the component under test and keep another to advance it.
#[derive(Clone, Debug, Default)]
pub struct NullClock {
    current: Rc<Cell<u64>>,
}

impl NullClock {
    pub fn new(initial: u64) -> Self {
        Self {
            current: Rc::new(Cell::new(initial)),
        }
    }

    /// Advance time by a number of ticks.
    pub fn advance(&self, ticks: u64) {
        self.current.set(self.current.get().saturating_add(ticks));
    }

    /// Set the time to a specific value.
    pub fn set(&self, ticks: u64) {
        self.current.set(ticks);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.current.get())
    }
}
