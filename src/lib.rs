//! # rfidkit
//!
//! Event bridge between application code and a handheld RFID scanner
//! driver:
//! - Forwards commands (init, mode, read/write, settings) to the driver
//! - Defers read/write requests until the reader reports it is open
//! - Fans native status, tag and setting events out to registered listeners
//!
//! ## Architecture
//!
//! rfidkit is organized as a workspace with multiple crates:
//!
//! 1. **rfidkit-core** - Event vocabulary, driver trait, the `ScannerBridge`
//! 2. **rfidkit-driver** - No-op driver and simulated reader
//! 3. **rfidkit-settings** - Settings file handling and validation
//! 4. **rfidkit** - Wiring, logging setup and the demo binary

use std::sync::{Arc, Weak};

pub use rfidkit_core::{
    init_scanner_bridge, keys, scanner_bridge, values, BeeperVolume, BridgeError, BridgeOptions,
    ConfigError, DriverError, Error, EventCategory, NativeEventSink, OperatingMode,
    PendingOperation, Result, ScannerBridge, ScannerConfig, ScannerDriver, ScannerEvent,
    SettingEvent, SharedDriver, StatusEvent, StatusValue, SubscriptionId, TagRead,
};
pub use rfidkit_driver::{NoOpDriver, SimulatedReader, SimulatedTag};
pub use rfidkit_settings::{
    BridgeSettings, DriverKind, LoggingSettings, ReaderSettings, Settings, SettingsError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging from settings
///
/// `RUST_LOG` overrides the configured level. Fails if a global subscriber
/// is already installed.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)?,
    };

    if settings.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_line_number(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Create a simulated reader with the configured region and access timeout
pub fn simulated_reader(settings: &ReaderSettings) -> SimulatedReader {
    SimulatedReader::new()
        .with_region(settings.region.clone())
        .with_access_timeout_ms(settings.access_timeout_ms)
}

/// Create the driver selected in `settings`
pub fn build_driver(settings: &ReaderSettings) -> SharedDriver {
    match settings.driver {
        DriverKind::Simulated => Arc::new(simulated_reader(settings)),
        DriverKind::NoOp => {
            tracing::debug!(
                "No-op driver ignores region {} and access timeout",
                settings.region
            );
            Arc::new(NoOpDriver::new())
        }
    }
}

/// Push antenna power and beeper volume to the reader every time it opens
pub fn apply_reader_settings_on_open(
    bridge: &Arc<ScannerBridge>,
    settings: &ReaderSettings,
) -> SubscriptionId {
    let weak: Weak<ScannerBridge> = Arc::downgrade(bridge);
    let antenna_power = settings.antenna_power;
    let beeper_volume = settings.beeper_volume;
    bridge.on(EventCategory::Status, move |event| {
        let ScannerEvent::Status(status) = event else {
            return;
        };
        if status.status != StatusValue::Opened {
            return;
        }
        if let Some(bridge) = weak.upgrade() {
            tracing::debug!("Applying reader settings");
            bridge.setting_antennas(antenna_power);
            bridge.setting_beeper(beeper_volume);
        }
    })
}

/// Create a bridge over `driver` configured from `settings`
pub fn create_bridge(settings: &Settings, driver: SharedDriver) -> Arc<ScannerBridge> {
    let bridge = ScannerBridge::with_options(Some(driver), BridgeOptions::from(&settings.bridge));
    apply_reader_settings_on_open(&bridge, &settings.reader);
    bridge
}

/// Install the process-wide bridge over `driver`
pub fn start_bridge(settings: &Settings, driver: SharedDriver) -> anyhow::Result<Arc<ScannerBridge>> {
    settings.validate()?;
    let bridge = init_scanner_bridge(driver, BridgeOptions::from(&settings.bridge))?;
    apply_reader_settings_on_open(&bridge, &settings.reader);
    tracing::info!(
        "rfidkit {} ({}) bridge started with {} driver",
        VERSION,
        BUILD_DATE,
        settings.reader.driver
    );
    Ok(bridge)
}
