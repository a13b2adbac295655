//! Event type definitions for the scanner bridge.
//!
//! Native drivers emit `ScannerEvent`s on one of four channels; the bridge
//! routes each to the listeners of the matching `EventCategory`.
//! Events are cloneable and serializable for logging/replay.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

/// Native channel carrying single tag reads
pub const TAG_CHANNEL: &str = "TagEvent";
/// Native channel carrying batches of tag reads
pub const TAGS_CHANNEL: &str = "TagsEvent";
/// Native channel carrying reader status changes
pub const STATUS_CHANNEL: &str = "RFIDStatusEvent";
/// Native channel carrying setting results
pub const SETTING_CHANNEL: &str = "SettingEvent";

/// Listener category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Single tag reads.
    #[serde(rename = "tag")]
    Tag,
    /// Batches of tag reads.
    #[serde(rename = "tags")]
    Tags,
    /// Reader status changes.
    #[serde(rename = "status")]
    Status,
    /// Setting results.
    #[serde(rename = "SettingEvent")]
    Setting,
    /// Reserved; nothing is dispatched here yet.
    #[serde(rename = "error")]
    Error,
}

impl EventCategory {
    /// Every category, in declaration order
    pub const ALL: [EventCategory; 5] = [
        EventCategory::Tag,
        EventCategory::Tags,
        EventCategory::Status,
        EventCategory::Setting,
        EventCategory::Error,
    ];

    /// Name used by application code to refer to this category
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Tag => "tag",
            EventCategory::Tags => "tags",
            EventCategory::Status => "status",
            EventCategory::Setting => "SettingEvent",
            EventCategory::Error => "error",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| BridgeError::UnknownCategory {
                name: s.to_string(),
            })
    }
}

/// Status reported by the reader
///
/// `Other` keeps the vocabulary open for drivers that report statuses this
/// crate does not know about yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusValue {
    Opened,
    Closed,
    Disconnect,
    BatchMode,
    Battery,
    InventoryStart,
    InventoryStop,
    WriteStart,
    WriteStop,
    /// Diagnostic message from the driver.
    Log,
    /// Status name not in the vocabulary above.
    Other(String),
}

impl StatusValue {
    /// Wire name of this status
    pub fn as_str(&self) -> &str {
        match self {
            StatusValue::Opened => "opened",
            StatusValue::Closed => "closed",
            StatusValue::Disconnect => "disconnect",
            StatusValue::BatchMode => "batchmode",
            StatusValue::Battery => "battery",
            StatusValue::InventoryStart => "inventoryStart",
            StatusValue::InventoryStop => "inventoryStop",
            StatusValue::WriteStart => "writeStart",
            StatusValue::WriteStop => "writeStop",
            StatusValue::Log => "log",
            StatusValue::Other(name) => name,
        }
    }
}

impl From<&str> for StatusValue {
    fn from(name: &str) -> Self {
        match name {
            "opened" => StatusValue::Opened,
            "closed" => StatusValue::Closed,
            "disconnect" => StatusValue::Disconnect,
            "batchmode" | "batchMode" => StatusValue::BatchMode,
            "battery" => StatusValue::Battery,
            "inventoryStart" => StatusValue::InventoryStart,
            "inventoryStop" => StatusValue::InventoryStop,
            "writeStart" => StatusValue::WriteStart,
            "writeStop" => StatusValue::WriteStop,
            "log" => StatusValue::Log,
            other => StatusValue::Other(other.to_string()),
        }
    }
}

impl From<String> for StatusValue {
    fn from(name: String) -> Self {
        StatusValue::from(name.as_str())
    }
}

impl From<StatusValue> for String {
    fn from(status: StatusValue) -> Self {
        match status {
            StatusValue::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of the status channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// The reported status.
    pub status: StatusValue,
    /// Extra text some statuses carry (battery level, batch info, log text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StatusEvent {
    pub fn new(status: StatusValue) -> Self {
        Self {
            status,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Parse the flat status string some drivers emit
    ///
    /// Accepts `"opened"`, `"battery 80"`, `"batchMode<info>"` and
    /// `"LOG: <text>"`; anything else becomes `StatusValue::Other`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(text) = raw.strip_prefix("LOG:") {
            return Self::new(StatusValue::Log).with_detail(text.trim());
        }
        if let Some(level) = raw.strip_prefix("battery ") {
            return Self::new(StatusValue::Battery).with_detail(level.trim());
        }
        const BATCH_PREFIX: &str = "batchmode";
        if raw.len() > BATCH_PREFIX.len()
            && raw
                .get(..BATCH_PREFIX.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BATCH_PREFIX))
        {
            return Self::new(StatusValue::BatchMode).with_detail(&raw[BATCH_PREFIX.len()..]);
        }
        Self::new(StatusValue::from(raw))
    }

    /// Flat string form, the inverse of [`StatusEvent::parse`]
    pub fn to_wire(&self) -> String {
        match (&self.status, &self.detail) {
            (StatusValue::Log, Some(text)) => format!("LOG: {}", text),
            (StatusValue::Battery, Some(level)) => format!("battery {}", level),
            (StatusValue::BatchMode, Some(info)) => format!("batchmode{}", info),
            (status, _) => status.as_str().to_string(),
        }
    }
}

impl From<StatusValue> for StatusEvent {
    fn from(status: StatusValue) -> Self {
        Self::new(status)
    }
}

/// One tag result: a tag id, memory contents, or an access outcome
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagRead {
    pub data: String,
}

impl TagRead {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }
}

impl fmt::Display for TagRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

/// Payload of the setting channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEvent {
    /// Setting name, e.g. `antenna_power`.
    pub name: String,
    /// Setting value as reported by the driver.
    pub value: serde_json::Value,
}

impl SettingEvent {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Event emitted by a driver and delivered to listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload")]
pub enum ScannerEvent {
    /// A single tag result.
    #[serde(rename = "TagEvent")]
    Tag(TagRead),
    /// A batch of tag results from one read cycle.
    #[serde(rename = "TagsEvent")]
    Tags(Vec<TagRead>),
    /// Reader status change.
    #[serde(rename = "RFIDStatusEvent")]
    Status(StatusEvent),
    /// Setting result.
    #[serde(rename = "SettingEvent")]
    Setting(SettingEvent),
}

impl ScannerEvent {
    /// Listener category this event is delivered to
    pub fn category(&self) -> EventCategory {
        match self {
            ScannerEvent::Tag(_) => EventCategory::Tag,
            ScannerEvent::Tags(_) => EventCategory::Tags,
            ScannerEvent::Status(_) => EventCategory::Status,
            ScannerEvent::Setting(_) => EventCategory::Setting,
        }
    }

    /// Native channel name this event arrives on
    pub fn channel(&self) -> &'static str {
        match self {
            ScannerEvent::Tag(_) => TAG_CHANNEL,
            ScannerEvent::Tags(_) => TAGS_CHANNEL,
            ScannerEvent::Status(_) => STATUS_CHANNEL,
            ScannerEvent::Setting(_) => SETTING_CHANNEL,
        }
    }

    /// Short description for logging
    pub fn description(&self) -> String {
        match self {
            ScannerEvent::Tag(tag) => format!("Tag {}", tag),
            ScannerEvent::Tags(tags) => format!("{} tags", tags.len()),
            ScannerEvent::Status(status) => format!("Status {}", status.to_wire()),
            ScannerEvent::Setting(setting) => {
                format!("Setting {} = {}", setting.name, setting.value)
            }
        }
    }

    pub fn status(status: StatusValue) -> Self {
        ScannerEvent::Status(StatusEvent::new(status))
    }

    pub fn tag(data: impl Into<String>) -> Self {
        ScannerEvent::Tag(TagRead::new(data))
    }
}
