pub use crate::utils::events::{EventHandler, EventManager};

pub mod events;
