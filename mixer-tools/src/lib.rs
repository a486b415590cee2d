#![doc(html_root_url = "https://docs.rs/mixer-tools/0.1.0")]

//! <h1 align="center">MIXER-TOOLS - Potentiometer & switch filtering for hardware mixers</h1>
//!
//! # Documentation
//!
//! This is the API documentation.<br/>
//! To see the code in action, run the programs of the `demos` directory
//! (`cargo run --example mixer_potentiometer`).
//!
//! # Features
//!
//! **Mixer-Tools** turns the raw readings of a hardware mixer (potentiometers wired to ADC inputs,
//! switches wired to digital inputs) into stable values, and reports them only when they
//! meaningfully change.
//!
//! - Normalize a raw ADC sample against a reference (supply) sample into a percentage or permille
//!   value, with a dead zone at both ends of the travel: [`normalize`](filters::normalize)
//! - Filter jitter with a hysteresis band that still settles on the ends of the travel: [`PotBank`](filters::PotBank)
//! - Detect switch transitions: [`SwitchBank`](filters::SwitchBank)
//! - Report changes as events, log lines and JSON lines over an extra [`Serial`](io::Serial)
//!   port: [`Mixer`]
//! - Decode those JSON lines on the host side: [`Notification`]
//!
//! The library never fails on bad samples: invalid channel ids and unusable reference readings
//! read as 0 and leave the state untouched.
//!
//! # Getting Started
//!
//! - Add the following to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! mixer-tools = "0.1.0"
//! ```
//!
//! - Feed the mixer from your polling loop:
//! ```rust
//! use mixer_tools::{Mixer, MixerEvent};
//!
//! let mixer = Mixer::default();
//!
//! mixer.on(MixerEvent::OnPotChange, |(id, value): (usize, u16)| {
//!     println!("Pot {} is now at {}%", id, value);
//!     Ok(())
//! });
//!
//! // Pot 0 at three quarters of a 12-bit ADC, measured against the supply.
//! let value = mixer.process_pot(0, 3072, 4095, false);
//! assert_eq!(value, 75);
//! ```
//!
//! # Logging
//!
//! The crate logs through the [`log`] facade: change notifications are emitted at `warn` level
//! with the `json` target, filter transitions at `trace` level.
//!
//! # Feature flags
//!
//! - **libudev** -- (enabled by default) Activates `serialport` crate _libudev_ feature under-the-hood (required on Linux only for port listing).
//! - **mocks** -- Provides mocked transports (useful for tests mostly).

pub mod config;
pub mod errors;
pub mod filters;
pub mod io;
pub mod mixer;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod notification;
pub mod utils;

pub use crate::config::MixerConfig;
pub use crate::mixer::{Mixer, MixerEvent};
pub use crate::notification::Notification;
