//! Scanner bridge implementation.
//!
//! Provides the `ScannerBridge` context object and the process-wide
//! instance used by application code.

use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast;

use super::events::{EventCategory, ScannerEvent, StatusValue};
use super::listeners::{ListenerRegistry, SubscriptionId};
use crate::config::{BeeperVolume, OperatingMode, ScannerConfig};
use crate::core::{NativeEventSink, ScannerDriver};
use crate::error::{BridgeError, DriverResult};
use crate::types::SharedDriver;

/// Configuration for the bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Channel capacity for async receivers.
    pub event_channel_capacity: usize,
    /// Maximum number of read/write requests held until the reader opens.
    pub pending_capacity: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            event_channel_capacity: 256,
            pending_capacity: 4,
        }
    }
}

/// A read or write requested before the reader finished opening
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOperation {
    Read(ScannerConfig),
    Write(ScannerConfig),
}

impl PendingOperation {
    fn name(&self) -> &'static str {
        match self {
            PendingOperation::Read(_) => "read",
            PendingOperation::Write(_) => "write",
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, PendingOperation::Read(_))
    }

    pub fn is_write(&self) -> bool {
        matches!(self, PendingOperation::Write(_))
    }

    pub fn config(&self) -> &ScannerConfig {
        match self {
            PendingOperation::Read(config) | PendingOperation::Write(config) => config,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    opened: bool,
    pending: VecDeque<PendingOperation>,
    pending_config: ScannerConfig,
}

impl SessionState {
    /// Queue `operation`, dropping the oldest entries beyond `capacity`
    ///
    /// A capacity of zero is treated as one.
    fn defer(&mut self, operation: PendingOperation, capacity: usize) {
        let bound = capacity.max(1);
        while self.pending.len() >= bound {
            if let Some(dropped) = self.pending.pop_front() {
                tracing::warn!(
                    "Deferred {} dropped; at most {} requests wait for the reader",
                    dropped.name(),
                    bound
                );
            }
        }
        tracing::debug!("Reader not open; deferring {}", operation.name());
        self.pending.push_back(operation);
    }
}

/// Bridge between application code and a scanner driver
///
/// Forwards calls to the driver one-to-one, fans native events out to
/// listeners per category, and holds read/write requests issued before the
/// reader reports `opened`.
pub struct ScannerBridge {
    driver: Option<SharedDriver>,
    listeners: RwLock<ListenerRegistry>,
    session: Mutex<SessionState>,
    sender: broadcast::Sender<ScannerEvent>,
    options: BridgeOptions,
}

impl ScannerBridge {
    /// Create a bridge over `driver` with default options
    pub fn new(driver: SharedDriver) -> Arc<Self> {
        Self::with_options(Some(driver), BridgeOptions::default())
    }

    /// Create a bridge with no driver; every forwarded call is ignored
    pub fn detached() -> Arc<Self> {
        Self::with_options(None, BridgeOptions::default())
    }

    /// Create a bridge with custom options
    ///
    /// The driver receives its event sink here, exactly once per bridge.
    pub fn with_options(driver: Option<SharedDriver>, options: BridgeOptions) -> Arc<Self> {
        let (sender, _) = broadcast::channel(options.event_channel_capacity.max(1));
        let bridge = Arc::new(Self {
            driver,
            listeners: RwLock::new(ListenerRegistry::default()),
            session: Mutex::new(SessionState::default()),
            sender,
            options,
        });
        if let Some(driver) = &bridge.driver {
            driver.attach(NativeEventSink::for_bridge(Arc::downgrade(&bridge)));
            tracing::debug!("Native event channels attached");
        }
        bridge
    }

    /// Whether a driver is attached
    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    // ------------------------------------------------------------------
    // Lifecycle control
    // ------------------------------------------------------------------

    pub fn init(&self) {
        self.forward("init", |driver| driver.init());
    }

    pub fn reconnect(&self) {
        self.forward("reconnect", |driver| driver.reconnect());
    }

    pub fn cancel(&self) {
        self.forward("cancel", |driver| driver.cancel());
    }

    pub fn shutdown(&self) {
        self.forward("shutdown", |driver| driver.shutdown());
    }

    /// Forward the mode to the driver; ignored when no driver is attached
    pub fn set_mode(&self, mode: OperatingMode, config: ScannerConfig) {
        self.forward("set_mode", |driver| driver.set_mode(&mode, &config));
    }

    // ------------------------------------------------------------------
    // Deferred read/write
    // ------------------------------------------------------------------

    /// Read now if the reader is open, otherwise once it opens
    pub fn read(&self, config: ScannerConfig) {
        let mut session = self.session.lock();
        session.pending_config = config.clone();
        if !session.opened {
            session.defer(PendingOperation::Read(config), self.options.pending_capacity);
            return;
        }
        drop(session);
        self.forward("read", |driver| driver.read(&config));
    }

    /// Write now if the reader is open, otherwise once it opens
    pub fn write(&self, config: ScannerConfig) {
        let mut session = self.session.lock();
        session.pending_config = config.clone();
        if !session.opened {
            session.defer(PendingOperation::Write(config), self.options.pending_capacity);
            return;
        }
        drop(session);
        self.forward("write", |driver| driver.write(&config));
    }

    // ------------------------------------------------------------------
    // Hardware configuration passthroughs
    // ------------------------------------------------------------------

    pub fn setting_antennas(&self, power_level: u16) {
        self.forward("setting_antennas", |driver| {
            driver.setting_antennas(power_level)
        });
    }

    pub fn getting_antennas(&self) {
        self.forward("getting_antennas", |driver| driver.getting_antennas());
    }

    pub fn setting_beeper(&self, volume: BeeperVolume) {
        self.forward("setting_beeper", |driver| driver.setting_beeper(volume));
    }

    pub fn getting_beeper(&self) {
        self.forward("getting_beeper", |driver| driver.getting_beeper());
    }

    // ------------------------------------------------------------------
    // Listener registry
    // ------------------------------------------------------------------

    /// Register a listener for `category`
    ///
    /// Listeners run on the thread that delivers the native event, in
    /// registration order.
    pub fn on<F>(&self, category: EventCategory, listener: F) -> SubscriptionId
    where
        F: Fn(&ScannerEvent) + Send + Sync + 'static,
    {
        let id = self.listeners.write().add(category, Arc::new(listener));
        tracing::debug!("Subscription {} added to {}", id, category);
        id
    }

    /// Remove one registration
    ///
    /// Returns true if the subscription was found under `category`.
    pub fn remove_listener(&self, category: EventCategory, id: SubscriptionId) -> bool {
        let removed = self.listeners.write().remove(category, id);
        if removed {
            tracing::debug!("Subscription {} removed from {}", id, category);
        }
        removed
    }

    /// Remove every listener of `category`
    pub fn remove_all_listeners(&self, category: EventCategory) {
        let removed = self.listeners.write().clear(category);
        if removed > 0 {
            tracing::debug!("{} subscriptions removed from {}", removed, category);
        }
    }

    pub fn has_listener(&self, category: EventCategory, id: SubscriptionId) -> bool {
        self.listeners.read().contains(category, id)
    }

    pub fn listener_count(&self, category: EventCategory) -> usize {
        self.listeners.read().count(category)
    }

    /// Get a receiver for async consumers
    ///
    /// Every dispatched event is also broadcast here, after the listeners ran.
    pub fn receiver(&self) -> broadcast::Receiver<ScannerEvent> {
        self.sender.subscribe()
    }

    // ------------------------------------------------------------------
    // Session state
    // ------------------------------------------------------------------

    pub fn is_opened(&self) -> bool {
        self.session.lock().opened
    }

    /// Whether a read is waiting for the reader to open
    pub fn defer_reading(&self) -> bool {
        self.session.lock().pending.iter().any(PendingOperation::is_read)
    }

    /// Whether a write is waiting for the reader to open
    pub fn defer_writing(&self) -> bool {
        self.session.lock().pending.iter().any(PendingOperation::is_write)
    }

    /// The config most recently passed to `read` or `write`
    pub fn pending_config(&self) -> ScannerConfig {
        self.session.lock().pending_config.clone()
    }

    /// Requests waiting for the reader to open, oldest first
    pub fn pending_operations(&self) -> Vec<PendingOperation> {
        self.session.lock().pending.iter().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Native event handling
    // ------------------------------------------------------------------

    /// Entry point for events coming from the driver
    ///
    /// Listeners see every event before the bridge applies its own state
    /// transition, so a status consumed internally still reaches them.
    pub fn handle_native_event(&self, event: ScannerEvent) {
        tracing::trace!("{} <- {}", event.channel(), event.description());
        self.dispatch(&event);
        if let ScannerEvent::Status(status) = &event {
            self.apply_status(&status.status);
        }
    }

    fn apply_status(&self, status: &StatusValue) {
        match status {
            StatusValue::Opened => {
                let flushed: Vec<PendingOperation> = {
                    let mut session = self.session.lock();
                    session.opened = true;
                    session.pending.drain(..).collect()
                };
                tracing::info!("Reader opened");
                for operation in flushed {
                    tracing::info!("Issuing deferred {}", operation.name());
                    match operation {
                        PendingOperation::Read(config) => {
                            self.forward("read", |driver| driver.read(&config))
                        }
                        PendingOperation::Write(config) => {
                            self.forward("write", |driver| driver.write(&config))
                        }
                    }
                }
            }
            StatusValue::Closed => {
                self.session.lock().opened = false;
                tracing::info!("Reader closed");
            }
            _ => {}
        }
    }

    fn dispatch(&self, event: &ScannerEvent) {
        let category = event.category();
        let listeners = self.listeners.read().snapshot(category);
        for (id, listener) in listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(event)));
            if let Err(payload) = outcome {
                tracing::error!(
                    "Listener {} on {} panicked: {}",
                    id,
                    category,
                    panic_message(payload.as_ref())
                );
            }
        }
        // No async receivers is fine
        let _ = self.sender.send(event.clone());
    }

    fn forward<F>(&self, operation: &'static str, call: F)
    where
        F: FnOnce(&dyn ScannerDriver) -> DriverResult<()>,
    {
        match &self.driver {
            Some(driver) => {
                tracing::debug!("Forwarding {} to driver", operation);
                if let Err(e) = call(driver.as_ref()) {
                    tracing::warn!("Driver {} failed: {}", operation, e);
                }
            }
            None => tracing::warn!("No scanner driver attached; {} ignored", operation),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl std::fmt::Debug for ScannerBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session.lock();
        f.debug_struct("ScannerBridge")
            .field("has_driver", &self.driver.is_some())
            .field("opened", &session.opened)
            .field("pending", &session.pending.len())
            .field("listeners", &self.listeners.read().total())
            .field("options", &self.options)
            .finish()
    }
}

/// Global bridge instance
static SCANNER_BRIDGE: OnceLock<Arc<ScannerBridge>> = OnceLock::new();

/// Get or initialize the global bridge
///
/// If `init_scanner_bridge` was never called this creates a detached bridge,
/// whose forwarded calls are ignored.
pub fn scanner_bridge() -> Arc<ScannerBridge> {
    SCANNER_BRIDGE
        .get_or_init(|| {
            tracing::warn!(
                "scanner_bridge() called before init_scanner_bridge(); \
                 installing a detached bridge, later forwards are ignored"
            );
            ScannerBridge::detached()
        })
        .clone()
}

/// Initialize the global bridge over `driver`
///
/// Must be called before any call to `scanner_bridge()`. The driver is only
/// attached if this call creates the bridge; otherwise it is dropped and
/// `AlreadyInitialized` is returned.
pub fn init_scanner_bridge(
    driver: SharedDriver,
    options: BridgeOptions,
) -> Result<Arc<ScannerBridge>, BridgeError> {
    let mut created = false;
    let bridge = SCANNER_BRIDGE.get_or_init(|| {
        created = true;
        ScannerBridge::with_options(Some(driver), options)
    });
    if created {
        Ok(bridge.clone())
    } else {
        Err(BridgeError::AlreadyInitialized)
    }
}
