//! The host store seam.
//!
//! Every call that touches the store goes through [`Backend`]. Methods report
//! failure as a raw [`Status`]; callers in this crate classify it with
//! [`RegistryError::from_status`](crate::error::RegistryError::from_status)
//! before returning to their own callers.
//!
//! Two implementations exist:
//!
//! - [`NativeBackend`] (Windows only) calls the Win32 registry API.
//! - [`MemoryBackend`] keeps the store in process and reproduces the host's
//!   statuses, so code built on this crate can be tested anywhere.

use crate::encoding::WideString;
use crate::enumerate::KeyInfo;
use crate::error::Status;
use crate::options::{Access, CreateOptions};
use crate::root::RootKey;
use crate::value::{RawValue, ValueKind};
use std::fmt;

pub mod memory;
#[cfg(windows)]
pub mod native;

pub use memory::{MemoryBackend, MemoryHandle};
#[cfg(windows)]
pub use native::NativeBackend;

/// Backend used when none is named explicitly.
#[cfg(windows)]
pub type DefaultBackend = NativeBackend;

/// Backend used when none is named explicitly.
#[cfg(not(windows))]
pub type DefaultBackend = MemoryBackend;

/// Result of a raw host call.
pub type HostResult<T> = std::result::Result<T, Status>;

/// Raw access to a hierarchical key-value store.
///
/// Names and paths arrive already encoded and normalized. Implementations
/// must not assume any ordering guarantee beyond what they document.
pub trait Backend {
    /// Native handle to one open key.
    type Handle: Copy + fmt::Debug + PartialEq;

    /// Returns the predefined handle of a root. Root handles are never closed.
    fn root(&self, root: RootKey) -> Self::Handle;

    /// Creates `path` under `parent` (with any missing intermediate keys) or
    /// opens it if it exists. Returns the handle and whether the key was new.
    fn create_key(
        &self,
        parent: Self::Handle,
        path: &WideString,
        options: CreateOptions,
        access: Access,
    ) -> HostResult<(Self::Handle, bool)>;

    /// Opens an existing key.
    fn open_key(
        &self,
        parent: Self::Handle,
        path: &WideString,
        access: Access,
    ) -> HostResult<Self::Handle>;

    /// Releases a handle returned by `create_key` or `open_key`.
    fn close_key(&self, handle: Self::Handle) -> HostResult<()>;

    /// Returns the stored kind of a value without reading its payload.
    fn query_value_kind(&self, handle: Self::Handle, name: &WideString) -> HostResult<ValueKind>;

    /// Reads a value. Expandable strings are returned unexpanded.
    fn query_value(&self, handle: Self::Handle, name: &WideString) -> HostResult<RawValue>;

    /// Creates or overwrites a value.
    fn set_value(&self, handle: Self::Handle, name: &WideString, value: &RawValue)
        -> HostResult<()>;

    /// Removes a value.
    fn delete_value(&self, handle: Self::Handle, name: &WideString) -> HostResult<()>;

    /// Removes a key that has no subkeys. `view` selects the 32/64-bit view.
    fn delete_key(&self, parent: Self::Handle, path: &WideString, view: Access)
        -> HostResult<()>;

    /// Removes `path` and everything below it. With an empty `path`, removes
    /// the subkeys and values of `handle` but keeps the key itself.
    fn delete_tree(&self, handle: Self::Handle, path: &WideString) -> HostResult<()>;

    /// Names of the immediate subkeys.
    fn enum_sub_keys(&self, handle: Self::Handle) -> HostResult<Vec<WideString>>;

    /// Names and kinds of the values directly under the key.
    fn enum_values(&self, handle: Self::Handle) -> HostResult<Vec<(WideString, ValueKind)>>;

    /// Counts, size limits and last write time of a key.
    fn query_info(&self, handle: Self::Handle) -> HostResult<KeyInfo>;

    /// Substitutes `%NAME%` environment placeholders.
    fn expand_environment(&self, text: &WideString) -> HostResult<WideString>;
}
