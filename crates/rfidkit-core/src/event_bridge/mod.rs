//! # Event Bridge Module
//!
//! Routes events from a native scanner driver to application listeners and
//! forwards application calls back to the driver.
//!
//! ## Overview
//!
//! - The driver emits events on four native channels (`TagEvent`,
//!   `TagsEvent`, `RFIDStatusEvent`, `SettingEvent`)
//! - Each event is delivered to the listeners of its `EventCategory`, in
//!   registration order, with a panicking listener isolated from the rest
//! - Reads and writes requested before the reader reports `opened` are held
//!   and issued, oldest first, once it does
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rfidkit_core::event_bridge::{scanner_bridge, EventCategory, ScannerEvent};
//! use rfidkit_core::ScannerConfig;
//!
//! let bridge = scanner_bridge();
//! let subscription = bridge.on(EventCategory::Tag, |event| {
//!     if let ScannerEvent::Tag(tag) = event {
//!         println!("Tag: {}", tag);
//!     }
//! });
//!
//! // Issued as soon as the reader is open
//! bridge.read(ScannerConfig::new().with("memory_bank", "epc"));
//!
//! bridge.remove_listener(EventCategory::Tag, subscription);
//! ```

mod bridge;
mod events;
mod listeners;

pub use bridge::*;
pub use events::*;
pub use listeners::SubscriptionId;
