//! Common type aliases
//!
//! Re-exports the aliases used across rfidkit crates.

pub mod aliases;

pub use aliases::*;
