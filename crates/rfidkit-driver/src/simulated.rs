//! In-memory RFID reader
//!
//! Behaves like a handheld reader with a population of tags in the field:
//! it connects on `init`, reports status changes, runs inventory and
//! read/write/lock access operations against its tags, and reports setting
//! changes. Events are emitted synchronously on the calling thread, after
//! the reader's own lock has been released.

use parking_lot::Mutex;
use rfidkit_core::{
    keys, BeeperVolume, ConfigError, DriverError, DriverResult, NativeEventSink, OperatingMode,
    ScannerConfig, ScannerDriver, ScannerEvent, SettingEvent, StatusEvent, StatusValue, TagRead,
};

use crate::mode::{LockTarget, MemoryBank, ModeConfig, CHARS_PER_WORD, MAX_READ_WORDS};

/// Antenna power index used until `setting_antennas` is called
pub const DEFAULT_ANTENNA_POWER: u16 = 240;
/// Highest antenna power index the reader accepts
pub const MAX_ANTENNA_POWER: u16 = 300;

/// Setting name reported for antenna power
pub const ANTENNA_POWER_SETTING: &str = keys::ANTENNA_POWER;
/// Setting name reported for beeper volume
pub const BEEPER_VOLUME_SETTING: &str = "beeper_volume";

/// Result text for a successful write
pub const WRITE_SUCCESS: &str = "WRITE SUCCESS";
/// Result text for a successful lock
pub const LOCK_SUCCESS: &str = "LOCK SUCCESS";
/// Result text when the target bank is locked
pub const MEMORY_LOCKED: &str = "TAG MEMORY LOCKED ERROR";
/// Result text when the access password does not match
pub const PASSWORD_ERROR: &str = "ACCESS PASSWORD ERROR";
/// Result text when a tag does not answer within the access timeout
pub const ACCESS_TIMEOUT: &str = "ACCESS TIMEOUT ERROR";

/// Regulatory region used until `with_region` is called
pub const DEFAULT_REGION: &str = "HKG";
/// Access operation wait time used until `with_access_timeout_ms` is called
pub const DEFAULT_ACCESS_TIMEOUT_MS: u64 = 1000;

/// A tag in the reader's field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimulatedTag {
    pub epc: String,
    pub tid: String,
    pub user: String,
    pub reserved: String,
    /// Access password; 0 means none.
    pub access_password: u32,
    pub locked: Vec<MemoryBank>,
    /// How long the tag takes to answer an access operation.
    pub response_ms: u64,
}

impl SimulatedTag {
    pub fn new(epc: impl Into<String>) -> Self {
        Self {
            epc: epc.into(),
            ..Default::default()
        }
    }

    pub fn with_tid(mut self, tid: impl Into<String>) -> Self {
        self.tid = tid.into();
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_response_ms(mut self, response_ms: u64) -> Self {
        self.response_ms = response_ms;
        self
    }

    pub fn with_access_password(mut self, password: u32) -> Self {
        self.access_password = password;
        self
    }

    /// Contents of a memory bank
    pub fn bank(&self, bank: MemoryBank) -> &str {
        match bank {
            MemoryBank::Reserved => &self.reserved,
            MemoryBank::Epc => &self.epc,
            MemoryBank::Tid => &self.tid,
            MemoryBank::User => &self.user,
        }
    }

    fn bank_mut(&mut self, bank: MemoryBank) -> &mut String {
        match bank {
            MemoryBank::Reserved => &mut self.reserved,
            MemoryBank::Epc => &mut self.epc,
            MemoryBank::Tid => &mut self.tid,
            MemoryBank::User => &mut self.user,
        }
    }

    pub fn is_locked(&self, bank: MemoryBank) -> bool {
        self.locked.contains(&bank)
    }

    fn times_out(&self, timeout_ms: u64) -> bool {
        self.response_ms > timeout_ms
    }

    fn matches(&self, config: &ModeConfig) -> bool {
        match &config.tag_id {
            None => true,
            Some(pattern) => self
                .bank(config.filter_memory_bank)
                .to_ascii_uppercase()
                .starts_with(&pattern.to_ascii_uppercase()),
        }
    }
}

#[derive(Debug)]
struct ReaderState {
    device_present: bool,
    initialised: bool,
    connected: bool,
    temp_disconnected: bool,
    mode: OperatingMode,
    mode_config: ModeConfig,
    active: bool,
    tags: Vec<SimulatedTag>,
    antenna_power: u16,
    beeper: BeeperVolume,
    region: String,
    supported_regions: Vec<String>,
    access_timeout_ms: u64,
}

impl ReaderState {
    fn require_connected(&self) -> DriverResult<()> {
        if !self.initialised {
            return Err(DriverError::NotInitialised);
        }
        if !self.connected {
            return Err(DriverError::NotConnected);
        }
        Ok(())
    }

    fn require_idle(&self) -> DriverResult<()> {
        if self.active {
            return Err(DriverError::InvalidUsage {
                reason: format!("{} operation in progress", self.mode),
            });
        }
        Ok(())
    }

    fn connect(&mut self) -> DriverResult<Vec<ScannerEvent>> {
        if self.connected {
            return Ok(Vec::new());
        }
        if !self.device_present {
            tracing::warn!("Connect RFID - No connected device");
            return Err(DriverError::DeviceUnavailable);
        }
        if !self.supported_regions.iter().any(|r| r == &self.region) {
            tracing::warn!("Region {} not supported by the reader", self.region);
            return Err(DriverError::OperationFailed {
                reason: format!("Region not found: {}", self.region),
            });
        }
        tracing::debug!(
            "Region set to {}; access timeout {} ms",
            self.region,
            self.access_timeout_ms
        );
        self.connected = true;
        self.temp_disconnected = false;
        tracing::info!("Connected to simulated reader");
        Ok(vec![ScannerEvent::status(StatusValue::Opened)])
    }

    fn cancel(&mut self) -> Vec<ScannerEvent> {
        if !self.active {
            return Vec::new();
        }
        self.active = false;
        if self.mode == OperatingMode::INVENTORY {
            vec![ScannerEvent::status(StatusValue::InventoryStop)]
        } else {
            Vec::new()
        }
    }

    fn inventory(&mut self) -> Vec<ScannerEvent> {
        if self.active {
            return Vec::new();
        }
        self.active = true;
        let mut events = vec![ScannerEvent::status(StatusValue::InventoryStart)];
        events.extend(tag_batch(self.tags.iter().map(|tag| tag.epc.clone())));
        events
    }

    fn read_access(&self) -> DriverResult<Vec<ScannerEvent>> {
        self.require_idle()?;
        let config = &self.mode_config;
        let mut results = Vec::new();
        for tag in self.tags.iter().filter(|tag| tag.matches(config)) {
            if tag.times_out(self.access_timeout_ms) {
                results.push(ACCESS_TIMEOUT.to_string());
                continue;
            }
            let data = word_aligned(tag.bank(config.memory_bank), config.read_words)?;
            results.push(config.trim_read_data(&data).to_string());
        }
        Ok(tag_batch(results))
    }

    fn write_access(&mut self) -> DriverResult<Vec<ScannerEvent>> {
        self.require_idle()?;
        let config = self.mode_config.clone();
        let Some(data) = config.tag_data.as_deref() else {
            return Err(ConfigError::MissingKey {
                key: keys::TAG_DATA.to_string(),
            }
            .into());
        };
        if config.tag_id.is_none() {
            return Err(ConfigError::MissingKey {
                key: keys::TAG_ID.to_string(),
            }
            .into());
        }

        let timeout_ms = self.access_timeout_ms;
        let mut results = Vec::new();
        for tag in self.tags.iter_mut().filter(|tag| tag.matches(&config)) {
            if tag.times_out(timeout_ms) {
                results.push(ACCESS_TIMEOUT.to_string());
                continue;
            }
            if tag.is_locked(config.memory_bank) {
                results.push(MEMORY_LOCKED.to_string());
                continue;
            }
            overwrite_prefix(tag.bank_mut(config.memory_bank), data);
            results.push(WRITE_SUCCESS.to_string());
        }

        let mut events = vec![ScannerEvent::status(StatusValue::WriteStart)];
        events.extend(tag_batch(results));
        Ok(events)
    }

    fn lock_access(&mut self) -> DriverResult<Vec<ScannerEvent>> {
        self.require_idle()?;
        let config = self.mode_config.clone();
        let target: LockTarget = config.lock_target.ok_or_else(|| ConfigError::MissingKey {
            key: keys::LOCK_MEMORY.to_string(),
        })?;

        let timeout_ms = self.access_timeout_ms;
        let mut results = Vec::new();
        for tag in self.tags.iter_mut().filter(|tag| tag.matches(&config)) {
            if tag.times_out(timeout_ms) {
                results.push(ACCESS_TIMEOUT.to_string());
                continue;
            }
            if tag.access_password != 0 && tag.access_password != config.lock_password {
                results.push(PASSWORD_ERROR.to_string());
                continue;
            }
            let bank = target.memory_bank();
            if !tag.is_locked(bank) {
                tag.locked.push(bank);
            }
            results.push(LOCK_SUCCESS.to_string());
        }
        Ok(tag_batch(results))
    }
}

/// Take `words` whole words from `data`, zero-filling past its end
///
/// Zero words means the whole bank.
fn word_aligned(data: &str, words: usize) -> DriverResult<String> {
    if words == 0 {
        return Ok(data.to_string());
    }
    if words > MAX_READ_WORDS {
        return Err(DriverError::InvalidUsage {
            reason: format!("read of {} words exceeds maximum {}", words, MAX_READ_WORDS),
        });
    }
    let wanted = words
        .checked_mul(CHARS_PER_WORD)
        .ok_or_else(|| DriverError::InvalidUsage {
            reason: format!("read of {} words overflows", words),
        })?;
    let mut out: String = data.chars().take(wanted).collect();
    let fill = wanted.saturating_sub(out.chars().count());
    out.extend(std::iter::repeat('0').take(fill));
    Ok(out)
}

fn overwrite_prefix(target: &mut String, data: &str) {
    let rest: String = target.chars().skip(data.chars().count()).collect();
    target.clear();
    target.push_str(data);
    target.push_str(&rest);
}

/// One tag event per result, then the batch
fn tag_batch(results: impl IntoIterator<Item = String>) -> Vec<ScannerEvent> {
    let tags: Vec<TagRead> = results.into_iter().map(TagRead::new).collect();
    let mut events: Vec<ScannerEvent> = tags.iter().cloned().map(ScannerEvent::Tag).collect();
    if !tags.is_empty() {
        events.push(ScannerEvent::Tags(tags));
    }
    events
}

/// Simulated handheld reader
pub struct SimulatedReader {
    state: Mutex<ReaderState>,
    sink: Mutex<Option<NativeEventSink>>,
}

impl SimulatedReader {
    /// A reader with a device present and no tags in the field
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ReaderState {
                device_present: true,
                initialised: false,
                connected: false,
                temp_disconnected: false,
                mode: OperatingMode::NONE,
                mode_config: ModeConfig::default(),
                active: false,
                tags: Vec::new(),
                antenna_power: DEFAULT_ANTENNA_POWER,
                beeper: BeeperVolume::default(),
                region: DEFAULT_REGION.to_string(),
                supported_regions: vec![DEFAULT_REGION.to_string()],
                access_timeout_ms: DEFAULT_ACCESS_TIMEOUT_MS,
            }),
            sink: Mutex::new(None),
        }
    }

    /// A reader that finds no device on `init`
    pub fn without_device() -> Self {
        let reader = Self::new();
        reader.state.lock().device_present = false;
        reader
    }

    /// Regulatory region applied on connect
    pub fn with_region(self, region: impl Into<String>) -> Self {
        self.state.lock().region = region.into();
        self
    }

    /// Regions the reader hardware accepts; connecting in any other fails
    pub fn with_supported_regions<I, S>(self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().supported_regions = regions.into_iter().map(Into::into).collect();
        self
    }

    /// How long an access operation waits for each tag to answer
    pub fn with_access_timeout_ms(self, timeout_ms: u64) -> Self {
        self.state.lock().access_timeout_ms = timeout_ms;
        self
    }

    pub fn region(&self) -> String {
        self.state.lock().region.clone()
    }

    pub fn access_timeout_ms(&self) -> u64 {
        self.state.lock().access_timeout_ms
    }

    pub fn with_tags(self, tags: impl IntoIterator<Item = SimulatedTag>) -> Self {
        self.state.lock().tags.extend(tags);
        self
    }

    pub fn add_tag(&self, tag: SimulatedTag) {
        self.state.lock().tags.push(tag);
    }

    /// Look up a tag by EPC
    pub fn tag(&self, epc: &str) -> Option<SimulatedTag> {
        self.state
            .lock()
            .tags
            .iter()
            .find(|tag| tag.epc == epc)
            .cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn mode(&self) -> OperatingMode {
        self.state.lock().mode.clone()
    }

    pub fn mode_config(&self) -> ModeConfig {
        self.state.lock().mode_config.clone()
    }

    pub fn antenna_power(&self) -> u16 {
        self.state.lock().antenna_power
    }

    pub fn beeper_volume(&self) -> BeeperVolume {
        self.state.lock().beeper
    }

    /// Handheld trigger pressed: start the operation of the current mode
    pub fn press_trigger(&self) -> DriverResult<()> {
        let events = {
            let mut state = self.state.lock();
            state.require_connected()?;
            let mode = state.mode.clone();
            if mode == OperatingMode::INVENTORY {
                state.inventory()
            } else if mode == OperatingMode::READ {
                state.read_access()?
            } else if mode == OperatingMode::WRITE {
                state.write_access()?
            } else if mode == OperatingMode::LOCK {
                state.lock_access()?
            } else if mode == OperatingMode::NONE {
                state.mode_config.tag_id = None;
                Vec::new()
            } else {
                return Err(DriverError::Unsupported {
                    operation: format!("trigger in {} mode", mode),
                });
            }
        };
        self.emit_all(events);
        Ok(())
    }

    /// Handheld trigger released: stop the running operation
    pub fn release_trigger(&self) {
        let events = {
            let mut state = self.state.lock();
            let mut events = Vec::new();
            if state.mode == OperatingMode::WRITE && state.connected {
                events.push(ScannerEvent::status(StatusValue::WriteStop));
            }
            events.extend(state.cancel());
            events
        };
        self.emit_all(events);
    }

    /// Drop the link as if the reader went out of range
    pub fn disconnect(&self) {
        let events = {
            let mut state = self.state.lock();
            if !state.connected {
                return;
            }
            state.connected = false;
            state.temp_disconnected = true;
            state.active = false;
            vec![ScannerEvent::status(StatusValue::Disconnect)]
        };
        self.emit_all(events);
    }

    /// Report a battery level change
    pub fn report_battery(&self, level: u8) {
        self.emit_all(vec![ScannerEvent::Status(
            StatusEvent::new(StatusValue::Battery).with_detail(level.to_string()),
        )]);
    }

    fn emit_all(&self, events: Vec<ScannerEvent>) {
        if events.is_empty() {
            return;
        }
        let sink = self.sink.lock().clone();
        match sink {
            Some(sink) => events.into_iter().for_each(|event| sink.emit(event)),
            None => tracing::debug!("No event sink attached; {} events dropped", events.len()),
        }
    }
}

impl Default for SimulatedReader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimulatedReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimulatedReader")
            .field("connected", &state.connected)
            .field("mode", &state.mode)
            .field("active", &state.active)
            .field("tags", &state.tags.len())
            .field("region", &state.region)
            .finish()
    }
}

impl ScannerDriver for SimulatedReader {
    fn attach(&self, sink: NativeEventSink) {
        *self.sink.lock() = Some(sink);
    }

    fn init(&self) -> DriverResult<()> {
        let events = {
            let mut state = self.state.lock();
            state.initialised = true;
            state.active = false;
            state.mode = OperatingMode::NONE;
            state.mode_config = ModeConfig::default();
            state.connect()?
        };
        self.emit_all(events);
        Ok(())
    }

    fn set_mode(&self, mode: &OperatingMode, config: &ScannerConfig) -> DriverResult<()> {
        let parsed = ModeConfig::parse(config)?;
        let events = {
            let mut state = self.state.lock();
            let mut events = vec![ScannerEvent::Status(
                StatusEvent::new(StatusValue::Log).with_detail(format!("SET MODE: {}", mode)),
            )];
            events.extend(state.cancel());
            state.mode = mode.clone();
            state.mode_config = parsed;
            tracing::debug!("Mode set to {}", mode);
            events
        };
        self.emit_all(events);
        Ok(())
    }

    fn read(&self, config: &ScannerConfig) -> DriverResult<()> {
        let parsed = ModeConfig::parse(config)?;
        let events = {
            let mut state = self.state.lock();
            state.require_connected()?;
            state.mode = OperatingMode::READ;
            state.mode_config = parsed;
            state.read_access()?
        };
        self.emit_all(events);
        Ok(())
    }

    fn write(&self, config: &ScannerConfig) -> DriverResult<()> {
        let parsed = ModeConfig::parse(config)?;
        let events = {
            let mut state = self.state.lock();
            state.require_connected()?;
            state.mode = OperatingMode::WRITE;
            state.mode_config = parsed;
            let mut events = state.write_access()?;
            events.push(ScannerEvent::status(StatusValue::WriteStop));
            events
        };
        self.emit_all(events);
        Ok(())
    }

    fn reconnect(&self) -> DriverResult<()> {
        let events = {
            let mut state = self.state.lock();
            if state.connected {
                tracing::info!("Simulated reader is already connected");
                Vec::new()
            } else if !state.temp_disconnected {
                tracing::info!("reconnect: not temp disconnected");
                Vec::new()
            } else {
                state.connected = true;
                state.temp_disconnected = false;
                tracing::info!("Reconnected to simulated reader");
                vec![ScannerEvent::status(StatusValue::Opened)]
            }
        };
        self.emit_all(events);
        Ok(())
    }

    fn cancel(&self) -> DriverResult<()> {
        let events = self.state.lock().cancel();
        self.emit_all(events);
        Ok(())
    }

    fn shutdown(&self) -> DriverResult<()> {
        let events = {
            let mut state = self.state.lock();
            let mut events = state.cancel();
            if state.connected || state.temp_disconnected {
                state.connected = false;
                state.temp_disconnected = false;
                events.push(ScannerEvent::status(StatusValue::Closed));
            } else {
                tracing::warn!("disconnect: no device was connected");
            }
            state.initialised = false;
            events
        };
        self.emit_all(events);
        Ok(())
    }

    fn setting_antennas(&self, power_level: u16) -> DriverResult<()> {
        if power_level > MAX_ANTENNA_POWER {
            return Err(DriverError::InvalidUsage {
                reason: format!(
                    "antenna power {} above maximum {}",
                    power_level, MAX_ANTENNA_POWER
                ),
            });
        }
        {
            let mut state = self.state.lock();
            state.require_connected()?;
            state.antenna_power = power_level;
        }
        self.emit_all(vec![ScannerEvent::Setting(SettingEvent::new(
            ANTENNA_POWER_SETTING,
            power_level,
        ))]);
        Ok(())
    }

    fn getting_antennas(&self) -> DriverResult<()> {
        let power = {
            let state = self.state.lock();
            state.require_connected()?;
            state.antenna_power
        };
        self.emit_all(vec![ScannerEvent::Setting(SettingEvent::new(
            ANTENNA_POWER_SETTING,
            power,
        ))]);
        Ok(())
    }

    fn setting_beeper(&self, volume: BeeperVolume) -> DriverResult<()> {
        {
            let mut state = self.state.lock();
            state.require_connected()?;
            state.beeper = volume;
        }
        self.emit_all(vec![ScannerEvent::Setting(SettingEvent::new(
            BEEPER_VOLUME_SETTING,
            volume.as_str(),
        ))]);
        Ok(())
    }

    fn getting_beeper(&self) -> DriverResult<()> {
        let volume = {
            let state = self.state.lock();
            state.require_connected()?;
            state.beeper
        };
        self.emit_all(vec![ScannerEvent::Setting(SettingEvent::new(
            BEEPER_VOLUME_SETTING,
            volume.as_str(),
        ))]);
        Ok(())
    }
}
