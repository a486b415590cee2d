//! Defines the tuning constants of a [`Mixer`](crate::Mixer).

use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::filters::Precision;

/// Maximum number of potentiometer channels a mixer can track.
pub const POT_COUNT_MAX: usize = 32;
/// Maximum number of switch channels a mixer can track.
pub const SWITCH_COUNT_MAX: usize = 32;

/// Tuning constants for the potentiometer filter.
///
/// All thresholds are expressed in permille (0..=1000) of the reference reading.
/// The default values are the ones used by the firmware: 0.3% hysteresis and a 1.5% dead zone at
/// both ends of the travel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Minimum reference reading considered valid: below it every sample reads as 0.
    pub vref_min: u16,
    /// Hysteresis band: a value must move strictly more than this to be reported.
    pub hysteresis: u16,
    /// Candidates strictly below this snap to 0.
    pub low_cut: u16,
    /// Candidates strictly above this snap to full scale.
    pub high_cut: u16,
    /// Resolution of the values returned by the mixer.
    pub precision: Precision,
}

impl MixerConfig {
    /// Builds a configuration from a JSON document. Missing fields take their default value.
    ///
    /// # Errors
    /// * `ParseError`: the document is not valid JSON or a field has the wrong type.
    ///
    /// # Example
    /// ```
    /// use mixer_tools::config::MixerConfig;
    /// use mixer_tools::filters::Precision;
    ///
    /// let config = MixerConfig::from_json(r#"{ "hysteresis": 5, "precision": "permille" }"#).unwrap();
    /// assert_eq!(config.hysteresis, 5);
    /// assert_eq!(config.precision, Precision::Permille);
    /// assert_eq!(config.vref_min, 32);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the same configuration with another output precision.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            vref_min: 32,
            hysteresis: 3,
            low_cut: 15,
            high_cut: 985,
            precision: Precision::Percent,
        }
    }
}
