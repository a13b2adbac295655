use rfidkit::{
    init_logging, keys, simulated_reader, start_bridge, values, DriverKind, EventCategory,
    OperatingMode, ScannerConfig, ScannerEvent, Settings, SimulatedTag,
};
use std::path::PathBuf;
use std::sync::Arc;

fn load_settings() -> anyhow::Result<Settings> {
    let path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => Settings::default_path()?,
    };
    Ok(Settings::load_or_default(&path)?)
}

fn demo_tags() -> Vec<SimulatedTag> {
    vec![
        SimulatedTag::new("E2000017221101441890ABCD")
            .with_tid("E2801105200074C1")
            .with_user("0123456789ABCDEF"),
        SimulatedTag::new("300833B2DDD9014000000000")
            .with_tid("E2003412013EFC00")
            .with_user("FFFFFFFFFFFFFFFF"),
    ]
}

fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    init_logging(&settings.logging)?;

    let reader = Arc::new(simulated_reader(&settings.reader).with_tags(demo_tags()));
    let bridge = match settings.reader.driver {
        DriverKind::Simulated => start_bridge(&settings, reader.clone())?,
        DriverKind::NoOp => start_bridge(&settings, rfidkit::build_driver(&settings.reader))?,
    };
    let mut receiver = bridge.receiver();

    bridge.on(EventCategory::Status, |event| {
        tracing::info!("status: {}", event.description())
    });
    bridge.on(EventCategory::Tags, |event| {
        if let ScannerEvent::Tags(tags) = event {
            tracing::info!("{} tag(s) reported", tags.len());
        }
    });

    // Requested before the reader is open; issued once it opens
    bridge.read(
        ScannerConfig::new()
            .with(keys::MEMORY_BANK, values::TID_MEMORY)
            .with(keys::READ_LENGTH, 8),
    );
    bridge.init();

    if settings.reader.driver == DriverKind::Simulated {
        bridge.set_mode(OperatingMode::INVENTORY, ScannerConfig::new());
        reader.press_trigger()?;
        reader.release_trigger();
    }

    bridge.write(
        ScannerConfig::new()
            .with(keys::FILTER_MEMORY_BANK, values::EPC_MEMORY)
            .with(keys::TAG_ID, "3008")
            .with(keys::TAG_DATA, "CAFE"),
    );
    bridge.getting_antennas();
    bridge.shutdown();

    while let Ok(event) = receiver.try_recv() {
        println!("{}", serde_json::to_string(&event)?);
    }

    Ok(())
}
