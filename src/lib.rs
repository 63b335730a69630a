//! Observer-driven cave streaming on top of the cavern runtime.
#![forbid(unsafe_code)]

pub mod cave;
pub mod config;
pub mod flight;

pub use cave::{CaveSettings, CaveSystem, FrustumSettings, Observer};
pub use config::{CaveConfig, ConfigError};
pub use flight::FlightPath;
