//! Defines the filters turning raw readings into debounced channel values.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub use crate::filters::pot::{normalize, PotBank, PotReading};
pub use crate::filters::switch::{SwitchBank, SwitchReading};

pub mod pot;
pub mod switch;

/// Full scale of the internal fixed-point representation (permille).
pub const FULL_SCALE: u16 = 1000;

/// Resolution of the values handed back to the caller.
///
/// Channel state is always kept in permille: the precision only changes how it is reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Values in 0..=100.
    #[default]
    Percent,
    /// Values in 0..=1000.
    Permille,
}

impl Precision {
    /// Retrieves the maximum value reported with this precision.
    pub fn scale(&self) -> u16 {
        match self {
            Precision::Percent => 100,
            Precision::Permille => FULL_SCALE,
        }
    }

    /// Converts a permille value to this precision (truncating).
    pub fn from_permille(&self, value: u16) -> u16 {
        value / (FULL_SCALE / self.scale())
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Precision::Percent => write!(f, "percent"),
            Precision::Permille => write!(f, "permille"),
        }
    }
}
