//! # Windows Registry Access
//!
//! Typed, lifecycle-safe access to the Windows registry.
//!
//! ## Features
//!
//! - **Owned handles**: [`RegKey`] closes its native handle on drop
//! - **Typed values**: DWORD, string, expandable string and multi-string
//!   reads and writes, with explicit type-mismatch errors
//! - **Stable errors**: every host status is classified into an [`ErrorKind`]
//!   while keeping the numeric code
//! - **One-shot operations**: [`ops::query`], [`ops::set`] and [`ops::delete`]
//!   open a private handle, do one thing and close it
//! - **Testable anywhere**: [`MemoryBackend`] reproduces the host's behaviour
//!   and statuses on every platform
//!
//! ## Architecture
//!
//! ```text
//! ops (query / set / delete)
//!   |
//! RegKey  --  value codec, enumeration
//!   |
//! Backend  --  NativeBackend (Win32) | MemoryBackend (in process)
//! ```
//!
//! Strings cross into the backend as NUL-terminated UTF-16 produced by
//! [`encoding`]; host statuses come back as raw [`error::Status`] values and
//! are classified into [`RegistryError`] before reaching callers.
//!
//! ## Examples
//!
//! ### Holding a key open
//!
//! ```rust
//! use regkey::{ExpandMode, KeyOptions, MemoryBackend, RegKey, RootKey};
//!
//! # fn main() -> regkey::Result<()> {
//! let backend = MemoryBackend::new();
//! backend.set_env("APPDIR", "C:\\App");
//!
//! let (key, _) = RegKey::create_with(backend, RootKey::CurrentUser, "Software/Vendor/App", KeyOptions::write())?;
//! key.set_string("Name", "demo")?;
//! key.set_expand_string("Data", "%APPDIR%\\data")?;
//! key.set_multi_string("Plugins", &["a", "b"])?;
//!
//! assert_eq!(key.get_string("Name")?, "demo");
//! assert_eq!(key.get_expand_string("Data", ExpandMode::Expand)?, "C:\\App\\data");
//! assert_eq!(key.get_multi_string("Plugins")?, vec!["a", "b"]);
//! # Ok(())
//! # }
//! ```
//!
//! ### One-shot operations
//!
//! ```rust
//! use regkey::{ops, Access, MemoryBackend, RegValue, RootKey};
//!
//! # fn main() -> regkey::Result<()> {
//! let backend = MemoryBackend::new();
//! ops::set(&backend, RootKey::CurrentUser, "Software/ata/test", "Version", 3u32, Access(0))?;
//! assert_eq!(
//!     ops::query(&backend, RootKey::CurrentUser, "Software/ata/test", "Version", Access(0))?,
//!     Some(RegValue::Dword(3))
//! );
//! ops::delete(&backend, RootKey::CurrentUser, "Software/ata", None, Access(0))?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod encoding;
pub mod enumerate;
pub mod error;
pub mod key;
pub mod ops;
pub mod options;
pub mod root;
pub mod value;

// Re-export main types for convenience
#[cfg(windows)]
pub use backend::NativeBackend;
pub use backend::{Backend, DefaultBackend, MemoryBackend, MemoryHandle};
pub use enumerate::KeyInfo;
pub use error::{ErrorKind, RegistryError, Result, ResultExt};
pub use key::RegKey;
pub use ops::{delete, query, set};
pub use options::{Access, CreateOptions, KeyOptions};
pub use root::{split_root, RootKey};
pub use value::{ExpandMode, RawValue, RegValue, ValueKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
