use std::fmt::{Display, Formatter};

use log::trace;

use crate::config::{MixerConfig, POT_COUNT_MAX};
use crate::filters::FULL_SCALE;

/// Converts a raw ADC sample into a permille value of the reference reading.
///
/// The dead zone of the given `config` is applied: values close to either end of the travel snap
/// to 0 or [`FULL_SCALE`]. Readings above the reference are clamped to the range.
///
/// # Parameters
/// * `raw`: the raw potentiometer sample
/// * `vref`: the raw reference (supply) sample
/// * `invert`: reverses the direction of travel
/// * `config`: the filter thresholds
///
/// # Returns
/// `None` when the reference is too small to divide by, the permille candidate otherwise.
///
/// # Example
/// ```
/// use mixer_tools::config::MixerConfig;
/// use mixer_tools::filters::normalize;
///
/// let config = MixerConfig::default();
/// assert_eq!(normalize(2048, 4095, false, &config), Some(500));
/// assert_eq!(normalize(2048, 4095, true, &config), Some(500));
/// assert_eq!(normalize(4050, 4095, false, &config), Some(1000));
/// assert_eq!(normalize(2048, 16, false, &config), None);
/// ```
pub fn normalize(raw: u16, vref: u16, invert: bool, config: &MixerConfig) -> Option<u16> {
    if vref < config.vref_min || vref == 0 {
        return None;
    }

    // Scaled before the division to keep the resolution.
    let mut candidate = (raw as u32 * FULL_SCALE as u32 / vref as u32) as i32;
    if invert {
        candidate = FULL_SCALE as i32 - candidate;
    }

    if candidate < config.low_cut as i32 {
        candidate = 0;
    }
    if candidate > config.high_cut as i32 {
        candidate = FULL_SCALE as i32;
    }

    Some(candidate.clamp(0, FULL_SCALE as i32) as u16)
}

/// Decides whether `candidate` should replace `last`.
///
/// A candidate is accepted when it moves strictly more than the hysteresis band away from the
/// stored value, or when it reaches an end of the travel the stored value is not already at:
/// otherwise a value drifting slowly into an end would never settle on it.
pub fn exceeds_hysteresis(candidate: u16, last: u16, hysteresis: u16) -> bool {
    let delta = (candidate as i32 - last as i32).abs();
    let at_end = candidate == 0 || candidate == FULL_SCALE;
    delta > hysteresis as i32 || (at_end && candidate != last)
}

/// The outcome of processing a potentiometer sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PotReading {
    /// The stored channel value, in the requested precision.
    pub value: u16,
    /// Whether the stored value was updated by this sample.
    pub changed: bool,
}

/// Caller-owned state of all potentiometer channels: the last reported value of each, in permille.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PotBank {
    values: [u16; POT_COUNT_MAX],
    highest_id: Option<usize>,
}

impl PotBank {
    /// Creates a bank with every channel at 0.
    pub fn new() -> Self {
        Self {
            values: [0; POT_COUNT_MAX],
            highest_id: None,
        }
    }

    /// Processes a new sample for the given channel.
    ///
    /// The channel value is only written when the sample passes the hysteresis filter. Invalid
    /// channel ids and invalid reference readings leave the bank untouched and read as 0.
    ///
    /// # Parameters
    /// * `id`: the channel id (must be lower than [`POT_COUNT_MAX`])
    /// * `raw`: the raw potentiometer sample
    /// * `vref`: the raw reference (supply) sample
    /// * `invert`: reverses the direction of travel
    /// * `config`: the filter thresholds and output precision
    pub fn process(
        &mut self,
        id: usize,
        raw: u16,
        vref: u16,
        invert: bool,
        config: &MixerConfig,
    ) -> PotReading {
        if id >= POT_COUNT_MAX {
            return PotReading::default();
        }
        let candidate = match normalize(raw, vref, invert, config) {
            Some(candidate) => candidate,
            None => return PotReading::default(),
        };

        if self.highest_id.map_or(true, |highest| highest < id) {
            self.highest_id = Some(id);
        }

        let last = self.values[id];
        let changed = exceeds_hysteresis(candidate, last, config.hysteresis);
        if changed {
            trace!("Pot {} moved: {} -> {}", id, last, candidate);
            self.values[id] = candidate;
        }

        PotReading {
            value: config.precision.from_permille(self.values[id]),
            changed,
        }
    }

    /// Retrieves the stored value of a channel, in permille.
    pub fn get(&self, id: usize) -> Option<u16> {
        self.values.get(id).copied()
    }

    /// Retrieves the highest channel id processed so far.
    pub fn get_highest_id(&self) -> Option<usize> {
        self.highest_id
    }
}

impl Default for PotBank {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PotBank {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let count = self.highest_id.map_or(0, |highest| highest + 1);
        write!(f, "PotBank {:?}", &self.values[..count])
    }
}
