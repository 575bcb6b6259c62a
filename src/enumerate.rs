//! Listing of subkeys and values of an open key.
//!
//! Results come back in whatever order the host reports them. The native
//! store does not promise sorted output, so callers that need an order must
//! sort themselves.

use crate::backend::Backend;
use crate::encoding::from_wide;
use crate::error::{RegistryError, Result};
use crate::key::RegKey;
use crate::value::ValueKind;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Seconds between the FILETIME epoch (1601-01-01) and the Unix epoch.
const FILETIME_UNIX_DIFF: i64 = 11_644_473_600;

/// FILETIME ticks (100 ns) per second.
const TICKS_PER_SECOND: u64 = 10_000_000;

/// Converts a Windows FILETIME to a UTC timestamp.
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    let seconds = (filetime / TICKS_PER_SECOND) as i64 - FILETIME_UNIX_DIFF;
    let nanos = ((filetime % TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(seconds, nanos)
}

/// Current time as a Windows FILETIME.
pub fn filetime_now() -> u64 {
    let now = Utc::now();
    let seconds = (now.timestamp() + FILETIME_UNIX_DIFF).max(0) as u64;
    seconds * TICKS_PER_SECOND + u64::from(now.timestamp_subsec_nanos()) / 100
}

/// Summary of one key as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyInfo {
    /// Number of immediate subkeys.
    pub sub_keys: u32,

    /// Number of values.
    pub values: u32,

    /// Longest subkey name, in UTF-16 units.
    pub max_sub_key_len: u32,

    /// Longest value name, in UTF-16 units.
    pub max_value_name_len: u32,

    /// Largest value payload, in bytes.
    pub max_value_len: u32,

    /// Last write time (Windows FILETIME).
    pub last_written: u64,
}

impl KeyInfo {
    /// Converts the last written timestamp to a UTC date.
    pub fn last_written_datetime(&self) -> Option<DateTime<Utc>> {
        filetime_to_datetime(self.last_written)
    }
}

impl<B: Backend> RegKey<B> {
    /// Lists the names of the immediate subkeys.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if the key is not open; host failures otherwise. An
    /// empty key yields an empty list.
    pub fn enum_sub_keys(&self) -> Result<Vec<String>> {
        let handle = self.raw_handle()?;
        let names = self
            .backend()
            .enum_sub_keys(handle)
            .map_err(|status| RegistryError::from_status(status, self.context("RegEnumKeyEx", "")))?;

        let names = names
            .iter()
            .map(|name| from_wide(name.as_units()))
            .collect::<Result<Vec<_>>>()?;
        debug!(key = %self.location(), count = names.len(), "Enumerated subkeys");
        Ok(names)
    }

    /// Lists the names and stored kinds of the values. Payloads are not read.
    pub fn enum_values(&self) -> Result<Vec<(String, ValueKind)>> {
        let handle = self.raw_handle()?;
        let values = self
            .backend()
            .enum_values(handle)
            .map_err(|status| RegistryError::from_status(status, self.context("RegEnumValue", "")))?;

        let values = values
            .iter()
            .map(|(name, kind)| Ok((from_wide(name.as_units())?, *kind)))
            .collect::<Result<Vec<_>>>()?;
        debug!(key = %self.location(), count = values.len(), "Enumerated values");
        Ok(values)
    }

    /// Returns counts, size limits and the last write time of the key.
    pub fn query_info(&self) -> Result<KeyInfo> {
        let handle = self.raw_handle()?;
        self.backend()
            .query_info(handle)
            .map_err(|status| RegistryError::from_status(status, self.context("RegQueryInfoKey", "")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[test]
    fn test_filetime_conversion() {
        // 2020-01-01T00:00:00Z
        let filetime = (1_577_836_800 + FILETIME_UNIX_DIFF) as u64 * TICKS_PER_SECOND;
        let dt = filetime_to_datetime(filetime).unwrap();
        assert_eq!(dt.to_rfc3339(), "2020-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_filetime_now_is_recent() {
        let dt = filetime_to_datetime(filetime_now()).unwrap();
        assert!((Utc::now() - dt).num_seconds().abs() < 5);
    }

    #[test]
    fn test_enumerate_closed_key() {
        let key = RegKey::new(MemoryBackend::new());
        assert!(matches!(key.enum_sub_keys(), Err(RegistryError::InvalidHandle)));
        assert!(matches!(key.enum_values(), Err(RegistryError::InvalidHandle)));
        assert!(matches!(key.query_info(), Err(RegistryError::InvalidHandle)));
    }
}
