//! Tests for the process-wide bridge instance
//!
//! Kept in its own test binary so no other test touches the global.

use rfidkit_core::{
    init_scanner_bridge, scanner_bridge, BeeperVolume, BridgeError, BridgeOptions, DriverResult,
    EventCategory, NativeEventSink, OperatingMode, ScannerConfig, ScannerDriver, ScannerEvent,
    StatusValue,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct CountingDriver {
    attached: AtomicUsize,
}

impl ScannerDriver for CountingDriver {
    fn attach(&self, _sink: NativeEventSink) {
        self.attached.fetch_add(1, Ordering::SeqCst);
    }
    fn init(&self) -> DriverResult<()> {
        Ok(())
    }
    fn set_mode(&self, _mode: &OperatingMode, _config: &ScannerConfig) -> DriverResult<()> {
        Ok(())
    }
    fn read(&self, _config: &ScannerConfig) -> DriverResult<()> {
        Ok(())
    }
    fn write(&self, _config: &ScannerConfig) -> DriverResult<()> {
        Ok(())
    }
    fn reconnect(&self) -> DriverResult<()> {
        Ok(())
    }
    fn cancel(&self) -> DriverResult<()> {
        Ok(())
    }
    fn shutdown(&self) -> DriverResult<()> {
        Ok(())
    }
    fn setting_antennas(&self, _power_level: u16) -> DriverResult<()> {
        Ok(())
    }
    fn getting_antennas(&self) -> DriverResult<()> {
        Ok(())
    }
    fn setting_beeper(&self, _volume: BeeperVolume) -> DriverResult<()> {
        Ok(())
    }
    fn getting_beeper(&self) -> DriverResult<()> {
        Ok(())
    }
}

#[test]
fn test_global_bridge_is_a_singleton() {
    let first_driver = Arc::new(CountingDriver::default());
    let bridge = init_scanner_bridge(first_driver.clone(), BridgeOptions::default())
        .expect("first initialization succeeds");

    let second_driver = Arc::new(CountingDriver::default());
    assert_eq!(
        init_scanner_bridge(second_driver.clone(), BridgeOptions::default()).err(),
        Some(BridgeError::AlreadyInitialized)
    );
    // The rejected driver never got a sink
    assert_eq!(second_driver.attached.load(Ordering::SeqCst), 0);
    assert_eq!(first_driver.attached.load(Ordering::SeqCst), 1);

    let a = scanner_bridge();
    let b = scanner_bridge();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &bridge));

    // State changed through one handle is visible through the other
    let id = a.on(EventCategory::Tag, |_| {});
    assert!(b.has_listener(EventCategory::Tag, id));

    a.read(ScannerConfig::new().with("a", 1));
    assert!(b.defer_reading());
    b.handle_native_event(ScannerEvent::status(StatusValue::Opened));
    assert!(a.is_opened());
    assert!(!a.defer_reading());
}
