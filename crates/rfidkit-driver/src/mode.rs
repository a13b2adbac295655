//! Mode configuration
//!
//! Interprets the opaque `ScannerConfig` the way a reader needs it for an
//! access operation: which memory banks to use, the filter pattern, and
//! read/write lengths rounded to 16-bit words (4 hex characters).

use rfidkit_core::{keys, values, ConfigError, ScannerConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hex characters per 16-bit tag memory word
pub const CHARS_PER_WORD: usize = 4;
/// Largest word count a single read may request
pub const MAX_READ_WORDS: usize = u16::MAX as usize;
/// Largest `read_length` accepted, in characters
pub const MAX_READ_LENGTH: u64 = (MAX_READ_WORDS * CHARS_PER_WORD) as u64;

/// Tag memory bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBank {
    Reserved,
    Epc,
    Tid,
    #[default]
    User,
}

impl MemoryBank {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryBank::Reserved => values::RESERVED_MEMORY,
            MemoryBank::Epc => values::EPC_MEMORY,
            MemoryBank::Tid => values::TID_MEMORY,
            MemoryBank::User => values::USER_MEMORY,
        }
    }
}

impl fmt::Display for MemoryBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryBank {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            values::RESERVED_MEMORY => Ok(MemoryBank::Reserved),
            values::EPC_MEMORY => Ok(MemoryBank::Epc),
            values::TID_MEMORY => Ok(MemoryBank::Tid),
            values::USER_MEMORY => Ok(MemoryBank::User),
            _ => Err(ConfigError::InvalidMemoryBank {
                value: s.to_string(),
            }),
        }
    }
}

/// What a lock operation protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockTarget {
    AccessPassword,
    UserMemory,
    EpcMemory,
}

impl LockTarget {
    /// Memory bank a lock on this target protects against writes
    pub fn memory_bank(&self) -> MemoryBank {
        match self {
            LockTarget::AccessPassword => MemoryBank::Reserved,
            LockTarget::UserMemory => MemoryBank::User,
            LockTarget::EpcMemory => MemoryBank::Epc,
        }
    }
}

impl FromStr for LockTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            values::LOCK_ACCESS_PASSWORD => Ok(LockTarget::AccessPassword),
            values::LOCK_USER_MEMORY => Ok(LockTarget::UserMemory),
            values::LOCK_EPC_MEMORY => Ok(LockTarget::EpcMemory),
            _ => Err(ConfigError::InvalidLockTarget {
                value: s.to_string(),
            }),
        }
    }
}

/// Parsed per-mode data
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModeConfig {
    /// Bank to read from or write to.
    pub memory_bank: MemoryBank,
    /// Bank the filter pattern is matched against.
    pub filter_memory_bank: MemoryBank,
    /// Hex prefix selecting which tags an access operation touches.
    pub tag_id: Option<String>,
    /// Hex payload to write, padded to whole words.
    pub tag_data: Option<String>,
    /// Number of `0` characters appended to `tag_data`.
    pub write_data_offset: usize,
    /// Words to read.
    pub read_words: usize,
    /// Characters to trim from the end of data read back.
    pub read_length_offset: usize,
    pub lock_target: Option<LockTarget>,
    pub lock_password: u32,
}

impl ModeConfig {
    /// Interpret a scanner configuration
    ///
    /// Memory banks default to `user`. `tagId` takes precedence over
    /// `filterTagId`.
    pub fn parse(config: &ScannerConfig) -> Result<Self, ConfigError> {
        let mut mode = ModeConfig {
            memory_bank: optional_str(config, keys::MEMORY_BANK)?
                .map(MemoryBank::from_str)
                .transpose()?
                .unwrap_or_default(),
            filter_memory_bank: optional_str(config, keys::FILTER_MEMORY_BANK)?
                .map(MemoryBank::from_str)
                .transpose()?
                .unwrap_or_default(),
            ..Default::default()
        };

        mode.tag_id = optional_str(config, keys::TAG_ID)?
            .or(optional_str(config, keys::FILTER_TAG_ID)?)
            .map(str::to_string);

        if let Some(data) = optional_str(config, keys::TAG_DATA)? {
            let (padded, offset) = pad_to_words(data);
            mode.tag_data = Some(padded);
            mode.write_data_offset = offset;
        }

        if let Some(value) = config.get(keys::READ_LENGTH) {
            let length = value.as_u64().ok_or_else(|| ConfigError::InvalidValue {
                key: keys::READ_LENGTH.to_string(),
                reason: format!("expected a non-negative integer, got {}", value),
            })?;
            if length > MAX_READ_LENGTH {
                return Err(ConfigError::InvalidValue {
                    key: keys::READ_LENGTH.to_string(),
                    reason: format!("{} exceeds maximum {}", length, MAX_READ_LENGTH),
                });
            }
            let (words, offset) = read_length_words(length as usize);
            mode.read_words = words;
            mode.read_length_offset = offset;
        }

        mode.lock_target = optional_str(config, keys::LOCK_MEMORY)?
            .map(LockTarget::from_str)
            .transpose()?;

        if let Some(password) = optional_str(config, keys::LOCK_PASSWORD)? {
            mode.lock_password =
                u32::from_str_radix(password, 16).map_err(|e| ConfigError::InvalidValue {
                    key: keys::LOCK_PASSWORD.to_string(),
                    reason: e.to_string(),
                })?;
        }

        Ok(mode)
    }

    /// Trim the padding a whole-word read added
    pub fn trim_read_data<'a>(&self, data: &'a str) -> &'a str {
        let keep = data.len().saturating_sub(self.read_length_offset);
        data.get(..keep).unwrap_or(data)
    }
}

fn optional_str<'a>(config: &'a ScannerConfig, key: &str) -> Result<Option<&'a str>, ConfigError> {
    match config.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("expected a string, got {}", other),
        }),
    }
}

/// Right-pad hex data with `0` to a whole number of words
///
/// Returns the padded data and how many characters were added.
pub fn pad_to_words(data: &str) -> (String, usize) {
    let rest = data.len() % CHARS_PER_WORD;
    if rest == 0 {
        return (data.to_string(), 0);
    }
    let offset = CHARS_PER_WORD - rest;
    let mut padded = String::with_capacity(data.len() + offset);
    padded.push_str(data);
    padded.extend(std::iter::repeat('0').take(offset));
    (padded, offset)
}

/// Convert a read length in characters to whole words
///
/// Returns the word count and how many surplus characters the last word adds.
pub fn read_length_words(length: usize) -> (usize, usize) {
    let words = length / CHARS_PER_WORD;
    let rest = length % CHARS_PER_WORD;
    if rest == 0 {
        (words, 0)
    } else {
        (words + 1, CHARS_PER_WORD - rest)
    }
}
