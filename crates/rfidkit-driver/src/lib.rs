//! # rfidkit-driver
//!
//! Scanner drivers for the rfidkit event bridge.
//!
//! - [`NoOpDriver`] accepts every call and emits nothing.
//! - [`SimulatedReader`] models a handheld reader with tags in its field,
//!   including deferred connection, access operations and settings.
//!
//! [`mode`] holds the parsing of per-mode configuration shared by drivers.

pub mod mode;
pub mod noop;
pub mod simulated;

pub use mode::{pad_to_words, read_length_words, LockTarget, MemoryBank, ModeConfig};
pub use noop::NoOpDriver;
pub use simulated::{SimulatedReader, SimulatedTag};
