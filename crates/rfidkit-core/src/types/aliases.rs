//! Type aliases for commonly used complex types.
//!
//! Gives names to the shared-ownership and callback types that appear in
//! bridge, driver, and test code.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rfidkit_core::types::*;
//!
//! // Instead of: Arc<dyn Fn(&ScannerEvent) + Send + Sync>
//! let listener: Listener = Arc::new(|event| println!("{}", event.description()));
//! ```

use parking_lot::Mutex;
use std::sync::Arc;

use crate::core::ScannerDriver;
use crate::event_bridge::ScannerEvent;

// =============================================================================
// THREAD-SAFE SHARED TYPES
// =============================================================================

/// A thread-safe vector, typically used to collect events in tests.
///
/// Uses `parking_lot::Mutex`, which does not poison on panic.
pub type ThreadSafeVec<T> = Arc<Mutex<Vec<T>>>;

/// Create a new empty thread-safe vector.
pub fn thread_safe_vec<T>() -> ThreadSafeVec<T> {
    Arc::new(Mutex::new(Vec::new()))
}

// =============================================================================
// CALLBACK AND HANDLE TYPES
// =============================================================================

/// A listener registered on the bridge.
///
/// Held behind `Arc` so a dispatch can snapshot the listener list and run it
/// without holding the registry lock.
pub type Listener = Arc<dyn Fn(&ScannerEvent) + Send + Sync>;

/// A shared handle to the native scanner driver.
pub type SharedDriver = Arc<dyn ScannerDriver>;
