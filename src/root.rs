//! Predefined root locations of the store.

use crate::encoding::{normalize_path, PATH_SEPARATOR};
use crate::error::{RegistryError, Result};
use std::fmt;
use std::str::FromStr;

/// One of the fixed top-level namespaces provided by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RootKey {
    /// `HKEY_CLASSES_ROOT`
    ClassesRoot,
    /// `HKEY_CURRENT_USER`
    CurrentUser,
    /// `HKEY_LOCAL_MACHINE`
    LocalMachine,
    /// `HKEY_USERS`
    Users,
    /// `HKEY_CURRENT_CONFIG`
    CurrentConfig,
}

impl RootKey {
    /// All roots, in predefined-handle order.
    pub const ALL: [RootKey; 5] = [
        RootKey::ClassesRoot,
        RootKey::CurrentUser,
        RootKey::LocalMachine,
        RootKey::Users,
        RootKey::CurrentConfig,
    ];

    /// Returns the predefined handle value the host assigns to this root.
    pub fn raw(self) -> u32 {
        match self {
            RootKey::ClassesRoot => 0x8000_0000,
            RootKey::CurrentUser => 0x8000_0001,
            RootKey::LocalMachine => 0x8000_0002,
            RootKey::Users => 0x8000_0003,
            RootKey::CurrentConfig => 0x8000_0005,
        }
    }

    /// Maps a predefined handle value back to its root.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|root| root.raw() == raw)
    }

    /// Returns the long name, e.g. `HKEY_CURRENT_USER`.
    pub fn name(self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootKey::CurrentUser => "HKEY_CURRENT_USER",
            RootKey::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootKey::Users => "HKEY_USERS",
            RootKey::CurrentConfig => "HKEY_CURRENT_CONFIG",
        }
    }

    /// Returns the short name, e.g. `HKCU`.
    pub fn short_name(self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKCR",
            RootKey::CurrentUser => "HKCU",
            RootKey::LocalMachine => "HKLM",
            RootKey::Users => "HKU",
            RootKey::CurrentConfig => "HKCC",
        }
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RootKey {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|root| {
                s.eq_ignore_ascii_case(root.name()) || s.eq_ignore_ascii_case(root.short_name())
            })
            .ok_or_else(|| RegistryError::invalid_argument(format!("unknown root key '{}'", s)))
    }
}

/// Splits a fully-qualified path such as `HKCU\Software\App` into its root
/// and the normalized remainder.
///
/// ```rust
/// # use regkey::{split_root, RootKey};
/// let (root, path) = split_root("HKEY_CURRENT_USER/Software/App").unwrap();
/// assert_eq!(root, RootKey::CurrentUser);
/// assert_eq!(path, "Software\\App");
/// ```
pub fn split_root(full_path: &str) -> Result<(RootKey, String)> {
    let normalized = normalize_path(full_path);
    let (head, rest) = match normalized.split_once(PATH_SEPARATOR) {
        Some((head, rest)) => (head, rest),
        None => (normalized.as_str(), ""),
    };
    Ok((head.parse()?, rest.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip() {
        for root in RootKey::ALL {
            assert_eq!(RootKey::from_raw(root.raw()), Some(root));
        }
        assert_eq!(RootKey::from_raw(0x8000_0004), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("HKLM".parse::<RootKey>().unwrap(), RootKey::LocalMachine);
        assert_eq!("hkey_users".parse::<RootKey>().unwrap(), RootKey::Users);
        assert!("HKEY_NOPE".parse::<RootKey>().is_err());
    }

    #[test]
    fn test_split_root() {
        let (root, path) = split_root("HKCR").unwrap();
        assert_eq!(root, RootKey::ClassesRoot);
        assert_eq!(path, "");

        let (root, path) = split_root("\\HKLM\\Software\\Vendor").unwrap();
        assert_eq!(root, RootKey::LocalMachine);
        assert_eq!(path, "Software\\Vendor");
    }
}
