//! Time-bounded emergency pause.

use concord_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::action::Warrant;

/// A component that an emergency pause can halt.
///
/// Only a supermajority warrant may engage a pause; any executed warrant may
/// lift one. Components consult [`Governed::is_paused`] in the entry points
/// the pause covers.
pub trait Governed {
    fn pause(&mut self, warrant: &Warrant, until: Timestamp) -> bool;
    fn lift_pause(&mut self, warrant: &Warrant);
    fn paused_until(&self) -> Option<Timestamp>;

    fn is_paused(&self, now: Timestamp) -> bool {
        self.paused_until().is_some_and(|until| now < until)
    }
}

/// Pause bookkeeping embedded by each pausable component.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseState {
    until: Option<Timestamp>,
}

impl PauseState {
    /// Engage the pause. Returns `false` (and changes nothing) unless the
    /// warrant carries a supermajority.
    pub fn engage(&mut self, warrant: &Warrant, until: Timestamp) -> bool {
        if !warrant.is_supermajority() {
            return false;
        }
        self.until = Some(until);
        true
    }

    pub fn lift(&mut self, _warrant: &Warrant) {
        self.until = None;
    }

    pub fn until(&self) -> Option<Timestamp> {
        self.until
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        self.until.is_some_and(|until| now < until)
    }
}
