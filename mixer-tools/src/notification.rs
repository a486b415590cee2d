//! Defines the JSON change messages sent by the mixer, and their decoding on the host side.
//!
//! Every message is a single line JSON object:
//! - potentiometers: `{"id":"sensor-pot2","value":73}` (value in percent)
//! - switches: `{"id":"binary_sensor-sw0","value":true}`

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Error, ParseError};

static ANSI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ANSI regex"));
static JSON_LOG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[A-Z]\]\[json:\d+\]:\s*(\{.*\})").expect("valid log line regex")
});
static POT_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sensor-pot(\d+)$").expect("valid pot id regex"));
static SWITCH_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^binary_sensor-sw(\d+)$").expect("valid switch id regex"));

/// A change message for a single channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A potentiometer moved: `value` is in percent.
    Pot { id: usize, value: u16 },
    /// A switch toggled.
    Switch { id: usize, value: bool },
}

/// The on-the-wire shape of a notification.
///
/// Switches may also come as `{"id":"binary_sensor-sw0","state":"ON"}` from the device web server.
#[derive(Serialize, Deserialize)]
struct Payload {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<String>,
}

impl Payload {
    fn new(id: String, value: Value) -> Self {
        Self {
            id,
            value: Some(value),
            state: None,
        }
    }

    /// Reads a pot value: numbers (possibly floats) only.
    fn as_percent(&self) -> Option<u16> {
        let value = self.value.as_ref()?.as_f64()?;
        Some(value.round().clamp(0.0, 100.0) as u16)
    }

    /// Reads a switch state: a boolean `value` first, then a textual `state` ("ON" is true).
    fn as_switch(&self) -> Option<bool> {
        if let Some(value) = self.value.as_ref().and_then(Value::as_bool) {
            return Some(value);
        }
        self.state
            .as_ref()
            .map(|state| state.eq_ignore_ascii_case("ON"))
    }
}

impl Notification {
    /// Retrieves the channel id the notification is about.
    pub fn get_id(&self) -> usize {
        match self {
            Notification::Pot { id, .. } => *id,
            Notification::Switch { id, .. } => *id,
        }
    }

    /// Extracts a notification from a line read on the device serial output.
    ///
    /// Both a bare JSON line and a device log line (`[W][json:042]: {...}`) are accepted; ANSI
    /// color codes are ignored. Any other line yields `None`.
    ///
    /// # Example
    /// ```
    /// use mixer_tools::Notification;
    ///
    /// let line = "\x1b[0;33m[W][json:042]: {\"id\":\"sensor-pot2\",\"value\":73}\x1b[0m";
    /// assert_eq!(
    ///     Notification::from_line(line),
    ///     Some(Notification::Pot { id: 2, value: 73 })
    /// );
    /// assert_eq!(Notification::from_line("[I][app:102]: booting"), None);
    /// ```
    pub fn from_line(line: &str) -> Option<Self> {
        let clean = ANSI_REGEX.replace_all(line, "");
        let trimmed = clean.trim();

        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            return trimmed.parse().ok();
        }

        let captures = JSON_LOG_REGEX.captures(&clean)?;
        captures.get(1)?.as_str().parse().ok()
    }

    fn to_payload(self) -> Payload {
        match self {
            Notification::Pot { id, value } => {
                Payload::new(format!("sensor-pot{}", id), Value::from(value))
            }
            Notification::Switch { id, value } => {
                Payload::new(format!("binary_sensor-sw{}", id), Value::from(value))
            }
        }
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.to_payload()) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

impl FromStr for Notification {
    type Err = Error;

    /// Decodes a bare JSON notification.
    ///
    /// Pot values may be sent as floats: they are rounded and clamped to 0..=100.
    fn from_str(json: &str) -> Result<Self, Self::Err> {
        let payload: Payload = serde_json::from_str(json)?;

        if let Some(captures) = POT_ID_REGEX.captures(&payload.id) {
            let id = parse_id(&captures[1])?;
            let value = payload.as_percent().ok_or_else(|| unexpected(json))?;
            return Ok(Notification::Pot { id, value });
        }

        if let Some(captures) = SWITCH_ID_REGEX.captures(&payload.id) {
            let id = parse_id(&captures[1])?;
            let value = payload.as_switch().ok_or_else(|| unexpected(json))?;
            return Ok(Notification::Switch { id, value });
        }

        Err(unexpected(json))
    }
}

fn parse_id(digits: &str) -> Result<usize, Error> {
    digits.parse().map_err(|_| ParseError {
        info: format!("invalid channel id '{}'", digits),
    })
}

fn unexpected(json: &str) -> Error {
    ParseError {
        info: format!("unexpected notification {}", json.trim()),
    }
}
