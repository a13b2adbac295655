//! Driver that accepts every call and does nothing
//!
//! Useful on hosts without reader hardware: the bridge stays fully usable,
//! it just never sees a status event.

use parking_lot::Mutex;
use rfidkit_core::{
    BeeperVolume, DriverResult, NativeEventSink, OperatingMode, ScannerConfig, ScannerDriver,
};

#[derive(Debug, Default)]
pub struct NoOpDriver {
    sink: Mutex<Option<NativeEventSink>>,
}

impl NoOpDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.sink.lock().is_some()
    }
}

impl ScannerDriver for NoOpDriver {
    fn attach(&self, sink: NativeEventSink) {
        *self.sink.lock() = Some(sink);
    }

    fn init(&self) -> DriverResult<()> {
        tracing::debug!("noop: init");
        Ok(())
    }

    fn set_mode(&self, mode: &OperatingMode, config: &ScannerConfig) -> DriverResult<()> {
        tracing::debug!("noop: set_mode {} ({} keys)", mode, config.len());
        Ok(())
    }

    fn read(&self, config: &ScannerConfig) -> DriverResult<()> {
        tracing::debug!("noop: read ({} keys)", config.len());
        Ok(())
    }

    fn write(&self, config: &ScannerConfig) -> DriverResult<()> {
        tracing::debug!("noop: write ({} keys)", config.len());
        Ok(())
    }

    fn reconnect(&self) -> DriverResult<()> {
        tracing::debug!("noop: reconnect");
        Ok(())
    }

    fn cancel(&self) -> DriverResult<()> {
        tracing::debug!("noop: cancel");
        Ok(())
    }

    fn shutdown(&self) -> DriverResult<()> {
        tracing::debug!("noop: shutdown");
        Ok(())
    }

    fn setting_antennas(&self, power_level: u16) -> DriverResult<()> {
        tracing::debug!("noop: setting_antennas {}", power_level);
        Ok(())
    }

    fn getting_antennas(&self) -> DriverResult<()> {
        tracing::debug!("noop: getting_antennas");
        Ok(())
    }

    fn setting_beeper(&self, volume: BeeperVolume) -> DriverResult<()> {
        tracing::debug!("noop: setting_beeper {}", volume);
        Ok(())
    }

    fn getting_beeper(&self) -> DriverResult<()> {
        tracing::debug!("noop: getting_beeper");
        Ok(())
    }
}
