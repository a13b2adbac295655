//! Scanner configuration vocabulary
//!
//! `ScannerConfig` is an open key/value object handed verbatim to the driver.
//! The bridge never inspects it; the key and value constants below name the
//! vocabulary that drivers understand today.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, ConfigError};

/// Recognized configuration keys
pub mod keys {
    /// Memory bank to read from or write to.
    pub const MEMORY_BANK: &str = "memory_bank";
    /// Tag id used as an access filter.
    pub const FILTER_TAG_ID: &str = "filterTagId";
    /// Tag id used as an access filter (older drivers).
    pub const TAG_ID: &str = "tagId";
    /// Hex payload to write.
    pub const TAG_DATA: &str = "tagData";
    /// Memory bank the filter pattern is matched against.
    pub const FILTER_MEMORY_BANK: &str = "filter_memory_bank";
    /// Number of hex characters to read.
    pub const READ_LENGTH: &str = "read_length";
    /// Lock target.
    pub const LOCK_MEMORY: &str = "lock_memory";
    /// Antenna transmit power index.
    pub const ANTENNA_POWER: &str = "antenna_power";
    /// Access password used for lock operations, in hex.
    pub const LOCK_PASSWORD: &str = "lock_password";
}

/// Recognized configuration values
pub mod values {
    /// User memory bank.
    pub const USER_MEMORY: &str = "user";
    /// EPC memory bank.
    pub const EPC_MEMORY: &str = "epc";
    /// TID memory bank.
    pub const TID_MEMORY: &str = "tid";
    /// Reserved memory bank.
    pub const RESERVED_MEMORY: &str = "reserved";

    /// Lock the access password.
    pub const LOCK_ACCESS_PASSWORD: &str = "lock_password";
    /// Lock user memory.
    pub const LOCK_USER_MEMORY: &str = "lock_user_memory";
    /// Lock EPC memory.
    pub const LOCK_EPC_MEMORY: &str = "lock_epc_memory";
}

/// Opaque configuration passed through to the driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScannerConfig(Map<String, Value>);

impl ScannerConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a value as a string slice, if present and a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Build from an arbitrary JSON value, which must be an object
    pub fn from_json(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            _ => Err(ConfigError::NotAnObject),
        }
    }
}

impl From<Map<String, Value>> for ScannerConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<ScannerConfig> for Value {
    fn from(config: ScannerConfig) -> Self {
        Value::Object(config.0)
    }
}

/// Operating mode requested through `set_mode`
///
/// The set of modes belongs to the driver and has grown over time, so this
/// is an open string newtype rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct OperatingMode(Cow<'static, str>);

impl OperatingMode {
    pub const NONE: OperatingMode = OperatingMode(Cow::Borrowed("none"));
    pub const INVENTORY: OperatingMode = OperatingMode(Cow::Borrowed("inventory"));
    pub const READ: OperatingMode = OperatingMode(Cow::Borrowed("read"));
    pub const WRITE: OperatingMode = OperatingMode(Cow::Borrowed("write"));
    pub const LOCK: OperatingMode = OperatingMode(Cow::Borrowed("lock"));
    pub const CHECK_USER: OperatingMode = OperatingMode(Cow::Borrowed("check_user"));
    pub const PERMA_LOCK: OperatingMode = OperatingMode(Cow::Borrowed("perma_lock"));

    /// Create a mode from any name, known or not
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OperatingMode {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<String> for OperatingMode {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&str> for OperatingMode {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<OperatingMode> for String {
    fn from(mode: OperatingMode) -> Self {
        mode.0.into_owned()
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Beeper volume accepted by `setting_beeper`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeeperVolume {
    /// Beeper off
    Quiet,
    Low,
    #[default]
    Medium,
    High,
}

impl BeeperVolume {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for BeeperVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BeeperVolume {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(BridgeError::UnknownBeeperVolume {
                name: s.to_string(),
            }),
        }
    }
}
