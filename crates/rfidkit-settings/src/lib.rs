//! rfidkit Settings Crate
//!
//! Loads, validates and saves the settings that configure the scanner
//! bridge, the reader driver and logging.

pub mod config;
pub mod error;

pub use config::{BridgeSettings, DriverKind, LoggingSettings, ReaderSettings, Settings};
pub use error::{SettingsError, SettingsResult};
