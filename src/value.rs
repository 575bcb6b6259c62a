//! Registry value kinds and typed value data.
//!
//! [`RawValue`] is what the host stores: a kind tag plus little-endian
//! payload bytes. [`RegValue`] is the decoded form for the four kinds this
//! crate reads and writes.

use crate::encoding::{
    decode_multi_string, decode_utf16_bytes, encode_multi_string, encode_utf16_bytes,
};
use crate::error::{RegistryError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::Cursor;

/// Registry value data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    /// No value type.
    None,

    /// String (null-terminated).
    String,

    /// String with environment variables.
    ExpandString,

    /// Binary data.
    Binary,

    /// 32-bit little-endian integer.
    Dword,

    /// 32-bit big-endian integer.
    DwordBigEndian,

    /// Symbolic link (Unicode).
    Link,

    /// Multiple strings.
    MultiString,

    /// Resource list.
    ResourceList,

    /// Full resource descriptor.
    FullResourceDescriptor,

    /// Resource requirements list.
    ResourceRequirementsList,

    /// 64-bit little-endian integer.
    Qword,

    /// Unknown or non-standard value type.
    /// Contains the raw type value.
    Unknown(u32),
}

impl ValueKind {
    /// Maps a raw host type code. Codes outside 0-11 are `Unknown`.
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => ValueKind::None,
            1 => ValueKind::String,
            2 => ValueKind::ExpandString,
            3 => ValueKind::Binary,
            4 => ValueKind::Dword,
            5 => ValueKind::DwordBigEndian,
            6 => ValueKind::Link,
            7 => ValueKind::MultiString,
            8 => ValueKind::ResourceList,
            9 => ValueKind::FullResourceDescriptor,
            10 => ValueKind::ResourceRequirementsList,
            11 => ValueKind::Qword,
            _ => ValueKind::Unknown(value),
        }
    }

    /// Returns the raw host type code.
    pub fn as_u32(&self) -> u32 {
        match self {
            ValueKind::None => 0,
            ValueKind::String => 1,
            ValueKind::ExpandString => 2,
            ValueKind::Binary => 3,
            ValueKind::Dword => 4,
            ValueKind::DwordBigEndian => 5,
            ValueKind::Link => 6,
            ValueKind::MultiString => 7,
            ValueKind::ResourceList => 8,
            ValueKind::FullResourceDescriptor => 9,
            ValueKind::ResourceRequirementsList => 10,
            ValueKind::Qword => 11,
            ValueKind::Unknown(value) => *value,
        }
    }

    /// Returns the name of this value type.
    pub fn name(&self) -> String {
        match self {
            ValueKind::None => "REG_NONE".to_string(),
            ValueKind::String => "REG_SZ".to_string(),
            ValueKind::ExpandString => "REG_EXPAND_SZ".to_string(),
            ValueKind::Binary => "REG_BINARY".to_string(),
            ValueKind::Dword => "REG_DWORD".to_string(),
            ValueKind::DwordBigEndian => "REG_DWORD_BIG_ENDIAN".to_string(),
            ValueKind::Link => "REG_LINK".to_string(),
            ValueKind::MultiString => "REG_MULTI_SZ".to_string(),
            ValueKind::ResourceList => "REG_RESOURCE_LIST".to_string(),
            ValueKind::FullResourceDescriptor => "REG_FULL_RESOURCE_DESCRIPTOR".to_string(),
            ValueKind::ResourceRequirementsList => "REG_RESOURCE_REQUIREMENTS_LIST".to_string(),
            ValueKind::Qword => "REG_QWORD".to_string(),
            ValueKind::Unknown(value) => format!("REG_UNKNOWN_{:#010x}", value),
        }
    }

    /// Returns true for the two text kinds.
    pub fn is_string(&self) -> bool {
        matches!(self, ValueKind::String | ValueKind::ExpandString)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Read mode for expandable strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandMode {
    /// Substitute `%NAME%` placeholders before returning.
    Expand,
    /// Return the stored text unchanged.
    DontExpand,
}

/// A value as stored by the host: kind plus raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    /// Stored kind.
    pub kind: ValueKind,
    /// Little-endian payload bytes.
    pub data: Vec<u8>,
}

impl RawValue {
    /// Creates a raw value.
    pub fn new(kind: ValueKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Reads the payload as a DWORD.
    pub fn to_dword(&self) -> Result<u32> {
        if self.data.len() < 4 {
            return Err(RegistryError::invalid_data(format!(
                "decoding {}-byte DWORD payload {}",
                self.data.len(),
                hex::encode(&self.data)
            )));
        }
        let mut cursor = Cursor::new(&self.data);
        cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| RegistryError::invalid_data(e.to_string()))
    }

    /// Reads the payload as text.
    pub fn to_text(&self) -> Result<String> {
        decode_utf16_bytes(&self.data)
    }

    /// Reads the payload as a string sequence.
    pub fn to_multi_string(&self) -> Result<Vec<String>> {
        decode_multi_string(&self.data)
    }
}

/// Decoded value data for the kinds this crate reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegValue {
    /// 32-bit unsigned integer.
    Dword(u32),

    /// Literal text.
    String(String),

    /// Text with `%NAME%` environment placeholders.
    ExpandString(String),

    /// Ordered sequence of strings.
    MultiString(Vec<String>),
}

impl RegValue {
    /// Returns the kind this value is stored as.
    pub fn kind(&self) -> ValueKind {
        match self {
            RegValue::Dword(_) => ValueKind::Dword,
            RegValue::String(_) => ValueKind::String,
            RegValue::ExpandString(_) => ValueKind::ExpandString,
            RegValue::MultiString(_) => ValueKind::MultiString,
        }
    }

    /// Encodes the value into its host representation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for text the host format cannot hold.
    pub fn to_raw(&self) -> Result<RawValue> {
        let data = match self {
            RegValue::Dword(d) => d.to_le_bytes().to_vec(),
            RegValue::String(s) | RegValue::ExpandString(s) => {
                if s.contains('\0') {
                    return Err(RegistryError::invalid_argument(format!(
                        "embedded NUL in string value {:?}",
                        s
                    )));
                }
                encode_utf16_bytes(s)
            }
            RegValue::MultiString(items) => encode_multi_string(items)?,
        };
        Ok(RawValue::new(self.kind(), data))
    }

    /// Decodes a raw value. Kinds outside the supported four yield `None`.
    pub fn from_raw(raw: &RawValue) -> Result<Option<Self>> {
        let value = match raw.kind {
            ValueKind::Dword => RegValue::Dword(raw.to_dword()?),
            ValueKind::String => RegValue::String(raw.to_text()?),
            ValueKind::ExpandString => RegValue::ExpandString(raw.to_text()?),
            ValueKind::MultiString => RegValue::MultiString(raw.to_multi_string()?),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Returns the integer if this is a DWORD.
    pub fn as_dword(&self) -> Option<u32> {
        match self {
            RegValue::Dword(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the text for either string kind.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RegValue::String(s) | RegValue::ExpandString(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for RegValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegValue::Dword(d) => write!(f, "{} (0x{:08X})", d, d),
            RegValue::String(s) | RegValue::ExpandString(s) => f.write_str(s),
            RegValue::MultiString(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<u32> for RegValue {
    fn from(value: u32) -> Self {
        RegValue::Dword(value)
    }
}

impl From<&str> for RegValue {
    fn from(value: &str) -> Self {
        RegValue::String(value.to_string())
    }
}

impl From<String> for RegValue {
    fn from(value: String) -> Self {
        RegValue::String(value)
    }
}

impl From<Vec<String>> for RegValue {
    fn from(value: Vec<String>) -> Self {
        RegValue::MultiString(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind() {
        assert_eq!(ValueKind::from_u32(1), ValueKind::String);
        assert_eq!(ValueKind::from_u32(4), ValueKind::Dword);
        assert_eq!(ValueKind::String.name(), "REG_SZ");
        assert_eq!(ValueKind::from_u32(0xFFFF0011), ValueKind::Unknown(0xFFFF0011));
        assert_eq!(ValueKind::Unknown(42).as_u32(), 42);
    }

    #[test]
    fn test_value_kind_codes_match_host() {
        for code in 0..=11 {
            assert_eq!(ValueKind::from_u32(code).as_u32(), code);
        }
    }

    #[test]
    fn test_dword_payload_is_little_endian() {
        let raw = RegValue::Dword(0x0102_0304).to_raw().unwrap();
        assert_eq!(raw.data, vec![0x04, 0x03, 0x02, 0x01]);
        assert_eq!(raw.kind, ValueKind::Dword);
    }

    #[test]
    fn test_short_dword_payload() {
        let raw = RawValue::new(ValueKind::Dword, vec![1, 2]);
        let err = raw.to_dword().unwrap_err();
        assert!(err.to_string().contains("0102"));
    }

    #[test]
    fn test_from_raw_unsupported_kind() {
        let raw = RawValue::new(ValueKind::Binary, vec![1, 2, 3]);
        assert_eq!(RegValue::from_raw(&raw).unwrap(), None);
    }

    #[test]
    fn test_string_with_nul_rejected() {
        assert!(RegValue::String("a\0b".into()).to_raw().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(RegValue::Dword(3).to_string(), "3 (0x00000003)");
        assert_eq!(
            RegValue::MultiString(vec!["a".into(), "b".into()]).to_string(),
            "a, b"
        );
    }
}
