//! Driver-facing interfaces

pub mod driver;

pub use driver::{NativeEventSink, ScannerDriver};
