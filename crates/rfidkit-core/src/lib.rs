//! # rfidkit Core
//!
//! Core types, traits, and the event bridge for rfidkit.
//! Provides the driver abstraction, the scanner event vocabulary,
//! and the bridge that connects the two to application code.

pub mod config;
pub mod core;
pub mod error;
pub mod event_bridge;
pub mod types;

pub use crate::core::{NativeEventSink, ScannerDriver};

pub use config::{keys, values, BeeperVolume, OperatingMode, ScannerConfig};

pub use error::{BridgeError, ConfigError, DriverError, DriverResult, Error, Result};

// Re-export the bridge for convenience
pub use event_bridge::{
    init_scanner_bridge, scanner_bridge, BridgeOptions, EventCategory, PendingOperation,
    ScannerBridge, ScannerEvent, SettingEvent, StatusEvent, StatusValue, SubscriptionId, TagRead,
};

pub use types::{thread_safe_vec, Listener, SharedDriver, ThreadSafeVec};
