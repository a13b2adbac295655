//! End-to-end tests: simulated reader driven through the event bridge

use parking_lot::Mutex;
use rfidkit_core::{
    keys, values, BeeperVolume, DriverError, EventCategory, OperatingMode, ScannerBridge,
    ScannerConfig, ScannerDriver, ScannerEvent, StatusValue, TagRead,
};
use rfidkit_driver::simulated::{
    ACCESS_TIMEOUT, LOCK_SUCCESS, MEMORY_LOCKED, PASSWORD_ERROR, WRITE_SUCCESS,
};
use rfidkit_driver::{MemoryBank, SimulatedReader, SimulatedTag};
use std::sync::Arc;

fn field() -> Vec<SimulatedTag> {
    vec![
        SimulatedTag::new("E2000017221101441890ABCD")
            .with_tid("E2801105200074C1")
            .with_user("0123456789ABCDEF"),
        SimulatedTag::new("300833B2DDD9014000000000")
            .with_tid("E2003412013EFC00")
            .with_user("FFFFFFFFFFFFFFFF"),
    ]
}

/// Records every event the bridge dispatches, in order
fn record_all(bridge: &ScannerBridge) -> Arc<Mutex<Vec<ScannerEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for category in [
        EventCategory::Tag,
        EventCategory::Tags,
        EventCategory::Status,
        EventCategory::Setting,
    ] {
        let seen = seen.clone();
        bridge.on(category, move |event| seen.lock().push(event.clone()));
    }
    seen
}

fn statuses(events: &[ScannerEvent]) -> Vec<StatusValue> {
    events
        .iter()
        .filter_map(|event| match event {
            ScannerEvent::Status(status) => Some(status.status.clone()),
            _ => None,
        })
        .collect()
}

fn tag_batches(events: &[ScannerEvent]) -> Vec<Vec<TagRead>> {
    events
        .iter()
        .filter_map(|event| match event {
            ScannerEvent::Tags(tags) => Some(tags.clone()),
            _ => None,
        })
        .collect()
}

fn setup() -> (Arc<SimulatedReader>, Arc<ScannerBridge>, Arc<Mutex<Vec<ScannerEvent>>>) {
    let reader = Arc::new(SimulatedReader::new().with_tags(field()));
    let bridge = ScannerBridge::new(reader.clone());
    let seen = record_all(&bridge);
    (reader, bridge, seen)
}

#[test]
fn test_init_opens_reader() {
    let (reader, bridge, seen) = setup();
    bridge.init();

    assert!(reader.is_connected());
    assert!(bridge.is_opened());
    assert_eq!(statuses(&seen.lock()), vec![StatusValue::Opened]);
}

#[test]
fn test_init_without_device_stays_closed() {
    let reader = Arc::new(SimulatedReader::without_device());
    let bridge = ScannerBridge::new(reader.clone());
    let seen = record_all(&bridge);

    bridge.init();
    assert!(!reader.is_connected());
    assert!(!bridge.is_opened());
    assert!(seen.lock().is_empty());
    assert_eq!(reader.init(), Err(DriverError::DeviceUnavailable));
}

#[test]
fn test_read_before_open_is_issued_on_open() {
    let (_reader, bridge, seen) = setup();

    let config = ScannerConfig::new()
        .with(keys::MEMORY_BANK, values::TID_MEMORY)
        .with(keys::READ_LENGTH, 6);
    bridge.read(config);
    assert!(bridge.defer_reading());
    assert!(seen.lock().is_empty());

    bridge.init();
    assert!(!bridge.defer_reading());

    let events = seen.lock().clone();
    // The open status is seen before the deferred read's results
    assert_eq!(events[0], ScannerEvent::status(StatusValue::Opened));
    assert_eq!(
        tag_batches(&events),
        vec![vec![TagRead::new("E28011"), TagRead::new("E20034")]]
    );
}

#[test]
fn test_read_filtered_by_tag_id() {
    let (_reader, bridge, seen) = setup();
    bridge.init();
    seen.lock().clear();

    bridge.read(
        ScannerConfig::new()
            .with(keys::MEMORY_BANK, values::USER_MEMORY)
            .with(keys::FILTER_MEMORY_BANK, values::EPC_MEMORY)
            .with(keys::FILTER_TAG_ID, "3008")
            .with(keys::READ_LENGTH, 4),
    );

    let events = seen.lock().clone();
    assert_eq!(
        events,
        vec![
            ScannerEvent::tag("FFFF"),
            ScannerEvent::Tags(vec![TagRead::new("FFFF")]),
        ]
    );
}

#[test]
fn test_write_before_open_is_issued_on_open() {
    let (reader, bridge, seen) = setup();

    bridge.write(
        ScannerConfig::new()
            .with(keys::MEMORY_BANK, values::USER_MEMORY)
            .with(keys::FILTER_MEMORY_BANK, values::EPC_MEMORY)
            .with(keys::TAG_ID, "E2000017")
            .with(keys::TAG_DATA, "CAF"),
    );
    assert!(bridge.defer_writing());

    bridge.init();
    assert!(!bridge.defer_writing());

    let tag = reader.tag("E2000017221101441890ABCD").unwrap();
    assert_eq!(tag.user, "CAF0456789ABCDEF");
    // The other tag did not match the filter
    assert_eq!(
        reader.tag("300833B2DDD9014000000000").unwrap().user,
        "FFFFFFFFFFFFFFFF"
    );

    let events = seen.lock().clone();
    assert_eq!(
        statuses(&events),
        vec![
            StatusValue::Opened,
            StatusValue::WriteStart,
            StatusValue::WriteStop
        ]
    );
    assert_eq!(
        tag_batches(&events),
        vec![vec![TagRead::new(WRITE_SUCCESS)]]
    );
}

#[test]
fn test_read_and_write_both_flushed_in_order() {
    let (reader, bridge, seen) = setup();

    bridge.write(
        ScannerConfig::new()
            .with(keys::FILTER_MEMORY_BANK, values::EPC_MEMORY)
            .with(keys::TAG_ID, "3008")
            .with(keys::TAG_DATA, "0000"),
    );
    bridge.read(
        ScannerConfig::new()
            .with(keys::FILTER_MEMORY_BANK, values::EPC_MEMORY)
            .with(keys::TAG_ID, "3008")
            .with(keys::READ_LENGTH, 8),
    );
    assert_eq!(bridge.pending_operations().len(), 2);

    bridge.init();
    assert!(bridge.pending_operations().is_empty());
    assert_eq!(reader.mode(), OperatingMode::READ);

    // The read observes the data written just before it
    let batches = tag_batches(&seen.lock());
    assert_eq!(
        batches,
        vec![
            vec![TagRead::new(WRITE_SUCCESS)],
            vec![TagRead::new("0000FFFF")],
        ]
    );
}

#[test]
fn test_inventory_trigger_cycle() {
    let (reader, bridge, seen) = setup();
    bridge.init();
    bridge.set_mode(OperatingMode::INVENTORY, ScannerConfig::new());
    seen.lock().clear();

    reader.press_trigger().unwrap();
    assert!(reader.is_active());
    // A second press while running reports nothing new
    reader.press_trigger().unwrap();
    reader.release_trigger();
    assert!(!reader.is_active());

    let events = seen.lock().clone();
    assert_eq!(
        statuses(&events),
        vec![StatusValue::InventoryStart, StatusValue::InventoryStop]
    );
    let batches = tag_batches(&events);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
    // Single-tag events precede their batch
    assert!(matches!(events[1], ScannerEvent::Tag(_)));
    assert!(matches!(events[2], ScannerEvent::Tag(_)));
    assert!(matches!(events[3], ScannerEvent::Tags(_)));
}

#[test]
fn test_set_mode_logs_and_cancels_inventory() {
    let (reader, bridge, seen) = setup();
    bridge.init();
    bridge.set_mode(OperatingMode::INVENTORY, ScannerConfig::new());
    reader.press_trigger().unwrap();
    seen.lock().clear();

    bridge.set_mode(OperatingMode::READ, ScannerConfig::new());
    assert!(!reader.is_active());
    assert_eq!(reader.mode(), OperatingMode::READ);

    let events = seen.lock().clone();
    assert_eq!(
        statuses(&events),
        vec![StatusValue::Log, StatusValue::InventoryStop]
    );
    match &events[0] {
        ScannerEvent::Status(status) => {
            assert_eq!(status.detail.as_deref(), Some("SET MODE: read"))
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_invalid_mode_config_keeps_previous_mode() {
    let (reader, bridge, _seen) = setup();
    bridge.init();
    bridge.set_mode(OperatingMode::INVENTORY, ScannerConfig::new());

    bridge.set_mode(
        OperatingMode::READ,
        ScannerConfig::new().with(keys::MEMORY_BANK, "flash"),
    );
    assert_eq!(reader.mode(), OperatingMode::INVENTORY);
}

#[test]
fn test_lock_then_write_is_refused() {
    let (reader, bridge, seen) = setup();
    bridge.init();

    let target = ScannerConfig::new()
        .with(keys::FILTER_MEMORY_BANK, values::EPC_MEMORY)
        .with(keys::TAG_ID, "E2000017");
    bridge.set_mode(
        OperatingMode::LOCK,
        target.clone().with(keys::LOCK_MEMORY, values::LOCK_USER_MEMORY),
    );
    reader.press_trigger().unwrap();
    reader.release_trigger();
    assert!(reader
        .tag("E2000017221101441890ABCD")
        .unwrap()
        .is_locked(MemoryBank::User));

    bridge.write(target.with(keys::TAG_DATA, "BEEF"));
    assert_eq!(
        reader.tag("E2000017221101441890ABCD").unwrap().user,
        "0123456789ABCDEF"
    );

    let batches = tag_batches(&seen.lock());
    assert_eq!(
        batches,
        vec![
            vec![TagRead::new(LOCK_SUCCESS)],
            vec![TagRead::new(MEMORY_LOCKED)],
        ]
    );
}

#[test]
fn test_lock_requires_matching_password() {
    let reader = Arc::new(
        SimulatedReader::new()
            .with_tags(vec![SimulatedTag::new("AAAA0001").with_access_password(0x1234)]),
    );
    let bridge = ScannerBridge::new(reader.clone());
    let seen = record_all(&bridge);
    bridge.init();

    let config = ScannerConfig::new().with(keys::LOCK_MEMORY, values::LOCK_EPC_MEMORY);
    bridge.set_mode(OperatingMode::LOCK, config.clone());
    reader.press_trigger().unwrap();
    bridge.set_mode(
        OperatingMode::LOCK,
        config.with(keys::LOCK_PASSWORD, "1234"),
    );
    reader.press_trigger().unwrap();

    assert_eq!(
        tag_batches(&seen.lock()),
        vec![
            vec![TagRead::new(PASSWORD_ERROR)],
            vec![TagRead::new(LOCK_SUCCESS)],
        ]
    );
    assert!(reader.tag("AAAA0001").unwrap().is_locked(MemoryBank::Epc));
}

#[test]
fn test_disconnect_and_reconnect() {
    let (reader, bridge, seen) = setup();
    bridge.init();

    reader.disconnect();
    assert!(!reader.is_connected());
    // A disconnect is not a close; the bridge keeps its opened flag
    assert!(bridge.is_opened());

    bridge.reconnect();
    assert!(reader.is_connected());
    assert_eq!(
        statuses(&seen.lock()),
        vec![
            StatusValue::Opened,
            StatusValue::Disconnect,
            StatusValue::Opened
        ]
    );

    // Reconnecting a live link is a no-op
    bridge.reconnect();
    assert_eq!(statuses(&seen.lock()).len(), 3);
}

#[test]
fn test_shutdown_closes_and_defers_again() {
    let (reader, bridge, seen) = setup();
    bridge.init();
    bridge.shutdown();

    assert!(!reader.is_connected());
    assert!(!bridge.is_opened());
    assert_eq!(
        statuses(&seen.lock()),
        vec![StatusValue::Opened, StatusValue::Closed]
    );

    bridge.read(ScannerConfig::new());
    assert!(bridge.defer_reading());
}

#[test]
fn test_settings_round_trip() {
    let (reader, bridge, seen) = setup();
    bridge.init();
    seen.lock().clear();

    bridge.setting_antennas(270);
    bridge.getting_antennas();
    bridge.setting_beeper(BeeperVolume::Quiet);
    bridge.getting_beeper();
    // Out of range; refused by the reader and swallowed by the bridge
    bridge.setting_antennas(400);

    assert_eq!(reader.antenna_power(), 270);
    assert_eq!(reader.beeper_volume(), BeeperVolume::Quiet);

    let settings: Vec<(String, serde_json::Value)> = seen
        .lock()
        .iter()
        .filter_map(|event| match event {
            ScannerEvent::Setting(setting) => Some((setting.name.clone(), setting.value.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        settings,
        vec![
            ("antenna_power".to_string(), serde_json::json!(270)),
            ("antenna_power".to_string(), serde_json::json!(270)),
            ("beeper_volume".to_string(), serde_json::json!("quiet")),
            ("beeper_volume".to_string(), serde_json::json!("quiet")),
        ]
    );
}

#[test]
fn test_operations_require_connection() {
    let reader = SimulatedReader::new().with_tags(field());
    assert_eq!(
        reader.read(&ScannerConfig::new()),
        Err(DriverError::NotInitialised)
    );
    assert_eq!(reader.press_trigger(), Err(DriverError::NotInitialised));

    reader.init().unwrap();
    reader.disconnect();
    assert_eq!(reader.getting_beeper(), Err(DriverError::NotConnected));
}

#[test]
fn test_battery_report_reaches_status_listeners() {
    let (reader, bridge, seen) = setup();
    bridge.init();
    reader.report_battery(87);

    let events = seen.lock().clone();
    match events.last() {
        Some(ScannerEvent::Status(status)) => {
            assert_eq!(status.status, StatusValue::Battery);
            assert_eq!(status.detail.as_deref(), Some("87"));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_oversized_read_length_is_refused() {
    let (reader, bridge, seen) = setup();
    bridge.init();
    seen.lock().clear();

    // Refused by the reader and swallowed by the bridge
    bridge.read(ScannerConfig::new().with(keys::READ_LENGTH, u64::MAX));
    assert!(seen.lock().is_empty());
    assert!(matches!(
        reader.read(&ScannerConfig::new().with(keys::READ_LENGTH, u64::MAX)),
        Err(DriverError::Config(_))
    ));

    // The reader is still usable afterwards
    bridge.read(ScannerConfig::new().with(keys::READ_LENGTH, 4));
    assert_eq!(tag_batches(&seen.lock()).len(), 1);
}

#[test]
fn test_oversized_read_deferred_until_open_is_refused() {
    let (_reader, bridge, seen) = setup();
    bridge.read(ScannerConfig::new().with(keys::READ_LENGTH, u64::MAX));

    bridge.init();
    assert!(bridge.is_opened());
    assert!(!bridge.defer_reading());
    assert_eq!(statuses(&seen.lock()), vec![StatusValue::Opened]);
    assert!(tag_batches(&seen.lock()).is_empty());
}

#[test]
fn test_unsupported_region_keeps_reader_closed() {
    let reader = Arc::new(
        SimulatedReader::new()
            .with_supported_regions(["USA", "EU"])
            .with_region("HKG"),
    );
    let bridge = ScannerBridge::new(reader.clone());
    let seen = record_all(&bridge);

    bridge.init();
    assert!(!reader.is_connected());
    assert!(!bridge.is_opened());
    assert!(seen.lock().is_empty());
    assert!(matches!(reader.init(), Err(DriverError::OperationFailed { .. })));

    let supported = SimulatedReader::new()
        .with_supported_regions(["USA", "EU"])
        .with_region("EU");
    supported.init().unwrap();
    assert!(supported.is_connected());
    assert_eq!(supported.region(), "EU");
}

#[test]
fn test_slow_tags_time_out() {
    let reader = Arc::new(
        SimulatedReader::new()
            .with_access_timeout_ms(200)
            .with_tags(vec![
                SimulatedTag::new("AAAA0001").with_user("1111"),
                SimulatedTag::new("AAAA0002")
                    .with_user("2222")
                    .with_response_ms(500),
            ]),
    );
    let bridge = ScannerBridge::new(reader.clone());
    let seen = record_all(&bridge);
    bridge.init();

    bridge.read(ScannerConfig::new().with(keys::READ_LENGTH, 4));
    bridge.write(
        ScannerConfig::new()
            .with(keys::FILTER_MEMORY_BANK, values::EPC_MEMORY)
            .with(keys::TAG_ID, "AAAA")
            .with(keys::TAG_DATA, "9999"),
    );

    assert_eq!(
        tag_batches(&seen.lock()),
        vec![
            vec![TagRead::new("1111"), TagRead::new(ACCESS_TIMEOUT)],
            vec![TagRead::new(WRITE_SUCCESS), TagRead::new(ACCESS_TIMEOUT)],
        ]
    );
    assert_eq!(reader.tag("AAAA0002").unwrap().user, "2222");
    assert_eq!(reader.access_timeout_ms(), 200);
}
