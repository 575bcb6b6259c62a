//! Conversion between Rust strings and the host's wide-character forms.
//!
//! The host store speaks UTF-16: names and paths are NUL-terminated `u16`
//! sequences, string payloads are little-endian UTF-16 bytes. Everything at
//! the crate boundary is UTF-8 `str`/`String`.

use crate::error::{RegistryError, Result};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::UTF_16LE;
use std::io::Cursor;

/// Separator between key path segments.
pub const PATH_SEPARATOR: char = '\\';

/// Alternative separator accepted on input.
pub const ALT_PATH_SEPARATOR: char = '/';

/// A NUL-terminated UTF-16 string ready to hand to the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct WideString(Vec<u16>);

impl WideString {
    /// Encodes `text`, rejecting interior NULs.
    pub fn new(text: &str) -> Result<Self> {
        if text.contains('\0') {
            return Err(RegistryError::invalid_argument(format!(
                "embedded NUL in {:?}",
                text
            )));
        }
        Ok(Self(to_wide(text)))
    }

    /// Wraps already-encoded units. A terminator is appended if missing.
    pub fn from_units(mut units: Vec<u16>) -> Self {
        if units.last() != Some(&0) {
            units.push(0);
        }
        Self(units)
    }

    /// Units including the trailing NUL.
    pub fn as_units(&self) -> &[u16] {
        &self.0
    }

    /// Pointer suitable for `PCWSTR` parameters.
    pub fn as_ptr(&self) -> *const u16 {
        self.0.as_ptr()
    }

    /// Units without the trailing NUL.
    pub fn without_nul(&self) -> &[u16] {
        let end = self.0.iter().position(|&u| u == 0).unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// Returns true if the string has no characters.
    pub fn is_empty(&self) -> bool {
        self.without_nul().is_empty()
    }

    /// Decodes back to UTF-8.
    pub fn to_string_checked(&self) -> Result<String> {
        from_wide(&self.0)
    }
}

/// Encodes `text` as NUL-terminated UTF-16.
pub fn to_wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Decodes UTF-16 units up to the first NUL.
///
/// # Errors
///
/// Returns an invalid data error for unpaired surrogates.
pub fn from_wide(units: &[u16]) -> Result<String> {
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    String::from_utf16(&units[..end])
        .map_err(|_| RegistryError::invalid_data("decoding UTF-16 host string"))
}

/// Decodes a little-endian UTF-16 payload, trimming trailing NULs.
///
/// Payloads with an odd byte count (the host does not enforce alignment)
/// have the dangling byte ignored.
pub fn decode_utf16_bytes(data: &[u8]) -> Result<String> {
    if data.is_empty() {
        return Ok(String::new());
    }

    let even = &data[..data.len() & !1];
    let (decoded, had_errors) = UTF_16LE.decode_without_bom_handling(even);
    if had_errors {
        return Err(RegistryError::invalid_data("decoding UTF-16 string value"));
    }

    Ok(decoded.trim_end_matches('\0').to_string())
}

/// Encodes `text` as a NUL-terminated little-endian UTF-16 payload.
pub fn encode_utf16_bytes(text: &str) -> Vec<u8> {
    let units = to_wide(text);
    let mut out = vec![0u8; units.len() * 2];
    LittleEndian::write_u16_into(&units, &mut out);
    out
}

/// Encodes a multi-string payload: every entry NUL-terminated, then a final NUL.
///
/// # Errors
///
/// Returns `InvalidArgument` if an entry is empty or contains NUL; the host
/// format cannot represent either.
pub fn encode_multi_string<S: AsRef<str>>(items: &[S]) -> Result<Vec<u8>> {
    let mut units = Vec::new();
    for item in items {
        let item = item.as_ref();
        if item.is_empty() {
            return Err(RegistryError::invalid_argument(
                "multi-string entries must not be empty",
            ));
        }
        if item.contains('\0') {
            return Err(RegistryError::invalid_argument(format!(
                "embedded NUL in multi-string entry {:?}",
                item
            )));
        }
        units.extend(item.encode_utf16());
        units.push(0);
    }
    if units.is_empty() {
        units.push(0);
    }
    units.push(0);

    let mut out = Vec::with_capacity(units.len() * 2);
    for unit in units {
        out.write_u16::<LittleEndian>(unit)
            .map_err(|e| RegistryError::invalid_argument(e.to_string()))?;
    }
    Ok(out)
}

/// Decodes a multi-string payload, preserving order.
///
/// Decoding stops at the first empty entry (the terminator).
pub fn decode_multi_string(data: &[u8]) -> Result<Vec<String>> {
    let mut cursor = Cursor::new(data);
    let mut units = Vec::with_capacity(data.len() / 2);
    while let Ok(unit) = cursor.read_u16::<LittleEndian>() {
        units.push(unit);
    }

    let mut items = Vec::new();
    for chunk in units.split(|&u| u == 0) {
        if chunk.is_empty() {
            break;
        }
        let item = String::from_utf16(chunk)
            .map_err(|_| RegistryError::invalid_data("decoding UTF-16 multi-string entry"))?;
        items.push(item);
    }
    Ok(items)
}

/// Normalizes a key path to the host form.
///
/// Forward slashes become backslashes, repeated separators collapse and
/// leading/trailing separators are dropped. An empty result names the
/// location the path is relative to.
///
/// ```rust
/// # use regkey::encoding::normalize_path;
/// assert_eq!(normalize_path("App/Settings"), "App\\Settings");
/// assert_eq!(normalize_path("\\App\\\\Settings/"), "App\\Settings");
/// assert_eq!(normalize_path(""), "");
/// ```
pub fn normalize_path(path: &str) -> String {
    path.split([PATH_SEPARATOR, ALT_PATH_SEPARATOR])
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\\")
}

/// Normalizes and encodes a key path in one step.
pub fn wide_path(path: &str) -> Result<WideString> {
    WideString::new(&normalize_path(path))
}

/// Encodes a value name. Value names are not path-normalized.
pub fn wide_name(name: &str) -> Result<WideString> {
    WideString::new(name)
}
