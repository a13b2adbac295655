//! Native scanner driver interface
//!
//! Defines the trait the bridge forwards calls to, and the sink a driver
//! uses to push events back into the bridge.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::config::{BeeperVolume, OperatingMode, ScannerConfig};
use crate::error::DriverResult;
use crate::event_bridge::{ScannerBridge, ScannerEvent};
use crate::types::{thread_safe_vec, ThreadSafeVec};

/// The native collaborator that actually talks to the reader
///
/// Calls are fire-and-forget from the bridge's point of view: results arrive
/// later through the [`NativeEventSink`] handed to [`ScannerDriver::attach`].
/// An `Err` return is logged by the bridge and not propagated.
pub trait ScannerDriver: Send + Sync {
    /// Receive the sink used to emit native events. Called once by the bridge.
    fn attach(&self, sink: NativeEventSink);

    /// Discover and connect to a reader
    fn init(&self) -> DriverResult<()>;

    /// Select the operating mode and its configuration
    fn set_mode(&self, mode: &OperatingMode, config: &ScannerConfig) -> DriverResult<()>;

    /// Run a read access operation
    fn read(&self, config: &ScannerConfig) -> DriverResult<()>;

    /// Run a write access operation
    fn write(&self, config: &ScannerConfig) -> DriverResult<()>;

    /// Re-open a reader that dropped its connection
    fn reconnect(&self) -> DriverResult<()>;

    /// Stop the operation in progress
    fn cancel(&self) -> DriverResult<()>;

    /// Disconnect and release the reader
    fn shutdown(&self) -> DriverResult<()>;

    /// Set antenna transmit power index
    fn setting_antennas(&self, power_level: u16) -> DriverResult<()>;

    /// Request the current antenna power; reported as a setting event
    fn getting_antennas(&self) -> DriverResult<()>;

    /// Set beeper volume
    fn setting_beeper(&self, volume: BeeperVolume) -> DriverResult<()>;

    /// Request the current beeper volume; reported as a setting event
    fn getting_beeper(&self) -> DriverResult<()>;
}

enum SinkTarget {
    Bridge(Weak<ScannerBridge>),
    Callback(Arc<dyn Fn(ScannerEvent) + Send + Sync>),
}

/// Handle a driver uses to emit native events
///
/// When bound to a bridge it holds only a weak reference, so a driver never
/// keeps its bridge alive.
#[derive(Clone)]
pub struct NativeEventSink {
    target: Arc<SinkTarget>,
}

impl NativeEventSink {
    pub(crate) fn for_bridge(bridge: Weak<ScannerBridge>) -> Self {
        Self {
            target: Arc::new(SinkTarget::Bridge(bridge)),
        }
    }

    /// Create a sink that hands every event to `callback`
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn(ScannerEvent) + Send + Sync + 'static,
    {
        Self {
            target: Arc::new(SinkTarget::Callback(Arc::new(callback))),
        }
    }

    /// Create a sink that records events, for driver tests
    pub fn collecting() -> (Self, ThreadSafeVec<ScannerEvent>) {
        let events = thread_safe_vec();
        let store = events.clone();
        let sink = Self::from_fn(move |event| store.lock().push(event));
        (sink, events)
    }

    /// Emit an event into the bridge
    pub fn emit(&self, event: ScannerEvent) {
        match self.target.as_ref() {
            SinkTarget::Bridge(bridge) => match bridge.upgrade() {
                Some(bridge) => bridge.handle_native_event(event),
                None => tracing::debug!("Bridge dropped; discarding {}", event.description()),
            },
            SinkTarget::Callback(callback) => callback(event),
        }
    }
}

impl fmt::Debug for NativeEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.target.as_ref() {
            SinkTarget::Bridge(_) => "bridge",
            SinkTarget::Callback(_) => "callback",
        };
        f.debug_struct("NativeEventSink")
            .field("target", &target)
            .finish()
    }
}
