use std::fmt::{Display, Formatter};

use log::trace;

use crate::config::SWITCH_COUNT_MAX;

/// The outcome of processing a switch sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwitchReading {
    /// The sampled value, handed back as is.
    pub value: bool,
    /// Whether the sample differs from the stored state.
    pub changed: bool,
}

/// Caller-owned state of all switch channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchBank {
    states: [bool; SWITCH_COUNT_MAX],
    highest_id: Option<usize>,
}

impl SwitchBank {
    /// Creates a bank with every switch off.
    pub fn new() -> Self {
        Self {
            states: [false; SWITCH_COUNT_MAX],
            highest_id: None,
        }
    }

    /// Processes a new sample for the given switch: a change is only signaled on transitions.
    /// Out of range ids pass the value through without touching the bank.
    pub fn process(&mut self, id: usize, value: bool) -> SwitchReading {
        if id >= SWITCH_COUNT_MAX {
            return SwitchReading {
                value,
                changed: false,
            };
        }

        if self.highest_id.map_or(true, |highest| highest < id) {
            self.highest_id = Some(id);
        }

        let changed = self.states[id] != value;
        if changed {
            trace!("Switch {} toggled: {}", id, value);
            self.states[id] = value;
        }

        SwitchReading { value, changed }
    }

    /// Retrieves the stored state of a switch.
    pub fn get(&self, id: usize) -> Option<bool> {
        self.states.get(id).copied()
    }

    /// Retrieves the highest switch id processed so far.
    pub fn get_highest_id(&self) -> Option<usize> {
        self.highest_id
    }
}

impl Default for SwitchBank {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SwitchBank {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let count = self.highest_id.map_or(0, |highest| highest + 1);
        write!(f, "SwitchBank {:?}", &self.states[..count])
    }
}
