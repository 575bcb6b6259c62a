//! Owned handle to one open key, and typed access to its values.

use crate::backend::{Backend, DefaultBackend};
use crate::encoding::{from_wide, normalize_path, wide_name, wide_path, WideString};
use crate::error::{RegistryError, Result, ResultExt};
use crate::options::{Access, KeyOptions};
use crate::root::RootKey;
use crate::value::{ExpandMode, RawValue, RegValue, ValueKind};
use std::fmt;
use tracing::{debug, instrument, warn};

/// An open location in the store.
///
/// A `RegKey` owns at most one native handle. It starts out invalid
/// ([`RegKey::new`]), becomes valid through [`create`](RegKey::create) or
/// [`open`](RegKey::open), and releases the handle on [`close`](RegKey::close)
/// or when dropped. Value and enumeration operations on an invalid key fail
/// with [`RegistryError::InvalidHandle`] without calling the host.
///
/// A `RegKey` is not meant to be shared between threads without external
/// locking; open a separate key per thread instead.
///
/// # Examples
///
/// ```rust
/// use regkey::{KeyOptions, MemoryBackend, RegKey, RootKey};
///
/// # fn main() -> regkey::Result<()> {
/// let backend = MemoryBackend::new();
/// let (key, created) =
///     RegKey::create_with(backend, RootKey::CurrentUser, "App/Settings", KeyOptions::write())?;
/// assert!(created);
///
/// key.set_dword("Version", 3)?;
/// assert_eq!(key.get_dword("Version")?, 3);
/// # Ok(())
/// # }
/// ```
pub struct RegKey<B: Backend = DefaultBackend> {
    backend: B,
    handle: Option<B::Handle>,
    access: Access,
    location: String,
}

impl<B: Backend> RegKey<B> {
    /// Creates a key object that holds no handle.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            handle: None,
            access: Access::default(),
            location: String::new(),
        }
    }

    /// Creates (or opens, if it exists) `path` under `root`.
    ///
    /// Returns the key and whether it was newly created.
    pub fn create_with(
        backend: B,
        root: RootKey,
        path: &str,
        options: KeyOptions,
    ) -> Result<(Self, bool)> {
        let mut key = Self::new(backend);
        let created = key.create(root, path, options)?;
        Ok((key, created))
    }

    /// Opens an existing `path` under `root`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the key does not exist.
    pub fn open_with(backend: B, root: RootKey, path: &str, options: KeyOptions) -> Result<Self> {
        let mut key = Self::new(backend);
        key.open(root, path, options)?;
        Ok(key)
    }

    /// Creates or opens `path` under `root`, replacing any handle this
    /// object already holds. Returns true if the key was newly created.
    ///
    /// On failure the object is left invalid.
    #[instrument(skip(self, options), fields(access = %options.access))]
    pub fn create(&mut self, root: RootKey, path: &str, options: KeyOptions) -> Result<bool> {
        self.close();
        let path = normalize_path(path);
        let location = join_location(root.name(), &path);
        let wide = WideString::new(&path)?;
        let parent = self.backend.root(root);

        let (handle, created) = self
            .backend
            .create_key(parent, &wide, options.create_options, options.access)
            .map_err(|status| {
                RegistryError::from_status(status, format!("RegCreateKeyEx [{}]", location))
            })?;

        debug!(key = %location, created, "Created key");
        self.adopt(handle, options.access, location);
        Ok(created)
    }

    /// Opens an existing `path` under `root`, replacing any handle this
    /// object already holds.
    ///
    /// On failure the object is left invalid.
    #[instrument(skip(self, options), fields(access = %options.access))]
    pub fn open(&mut self, root: RootKey, path: &str, options: KeyOptions) -> Result<()> {
        self.close();
        let path = normalize_path(path);
        let location = join_location(root.name(), &path);
        let wide = WideString::new(&path)?;
        let parent = self.backend.root(root);

        let handle = self
            .backend
            .open_key(parent, &wide, options.access)
            .map_err(|status| {
                RegistryError::from_status(status, format!("RegOpenKeyEx [{}]", location))
            })?;

        debug!(key = %location, "Opened key");
        self.adopt(handle, options.access, location);
        Ok(())
    }

    /// Releases the native handle. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(status) = self.backend.close_key(handle) {
                warn!(key = %self.location, %status, "Failed to close key");
            }
        }
    }

    /// Returns true while a native handle is held.
    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns the native handle without giving up ownership.
    pub fn get(&self) -> Option<B::Handle> {
        self.handle
    }

    /// Access mask the key was opened with.
    pub fn access(&self) -> Access {
        self.access
    }

    /// Root-qualified path of the key, e.g. `HKEY_CURRENT_USER\App`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Backend the key was opened through.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn raw_handle(&self) -> Result<B::Handle> {
        self.handle.ok_or(RegistryError::InvalidHandle)
    }

    pub(crate) fn context(&self, operation: &str, name: &str) -> String {
        if name.is_empty() {
            format!("{} [{}]", operation, self.location)
        } else {
            format!("{} [{}] '{}'", operation, self.location, name)
        }
    }

    fn adopt(&mut self, handle: B::Handle, access: Access, location: String) {
        self.handle = Some(handle);
        self.access = access;
        self.location = location;
    }

    fn read_raw(&self, name: &str) -> Result<RawValue> {
        let handle = self.raw_handle()?;
        let wide = wide_name(name)?;
        self.backend
            .query_value(handle, &wide)
            .map_err(|status| RegistryError::from_status(status, self.context("RegQueryValueEx", name)))
    }

    fn read_kind(&self, name: &str, expected: ValueKind) -> Result<RawValue> {
        let raw = self.read_raw(name)?;
        if raw.kind != expected {
            return Err(RegistryError::type_mismatch(name, expected, raw.kind));
        }
        Ok(raw)
    }

    /// Reads a DWORD value.
    ///
    /// # Errors
    ///
    /// `NotFound` if the value is absent, `TypeMismatch` if it is stored as
    /// another kind.
    pub fn get_dword(&self, name: &str) -> Result<u32> {
        self.read_kind(name, ValueKind::Dword)?.to_dword()
    }

    /// Reads a DWORD value, returning `default` if it does not exist.
    pub fn get_dword_or(&self, name: &str, default: u32) -> Result<u32> {
        Ok(self.get_dword(name).optional()?.unwrap_or(default))
    }

    /// Reads a string value.
    pub fn get_string(&self, name: &str) -> Result<String> {
        self.read_kind(name, ValueKind::String)?.to_text()
    }

    /// Reads a string value, returning `default` if it does not exist.
    pub fn get_string_or(&self, name: &str, default: &str) -> Result<String> {
        Ok(self
            .get_string(name)
            .optional()?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Reads an expandable string value.
    ///
    /// With [`ExpandMode::Expand`] environment placeholders are substituted
    /// by the host; with [`ExpandMode::DontExpand`] the stored text is
    /// returned as is.
    pub fn get_expand_string(&self, name: &str, mode: ExpandMode) -> Result<String> {
        let text = self.read_kind(name, ValueKind::ExpandString)?.to_text()?;
        match mode {
            ExpandMode::DontExpand => Ok(text),
            ExpandMode::Expand => {
                let wide = WideString::new(&text)?;
                let expanded = self.backend.expand_environment(&wide).map_err(|status| {
                    RegistryError::from_status(status, self.context("ExpandEnvironmentStrings", name))
                })?;
                from_wide(expanded.as_units())
            }
        }
    }

    /// Reads a multi-string value. Order is preserved.
    pub fn get_multi_string(&self, name: &str) -> Result<Vec<String>> {
        self.read_kind(name, ValueKind::MultiString)?.to_multi_string()
    }

    /// Returns the stored kind of a value without decoding it.
    pub fn query_value_type(&self, name: &str) -> Result<ValueKind> {
        let handle = self.raw_handle()?;
        let wide = wide_name(name)?;
        self.backend
            .query_value_kind(handle, &wide)
            .map_err(|status| RegistryError::from_status(status, self.context("RegQueryValueEx", name)))
    }

    /// Reads a value of any of the four supported kinds. Expandable strings
    /// come back unexpanded.
    ///
    /// # Errors
    ///
    /// A host failure with `ERROR_UNSUPPORTED_TYPE` for other kinds.
    pub fn get_value(&self, name: &str) -> Result<RegValue> {
        let raw = self.read_raw(name)?;
        RegValue::from_raw(&raw)?.ok_or_else(|| RegistryError::Host {
            context: self.context(&format!("decoding {}", raw.kind), name),
            code: crate::error::status::ERROR_UNSUPPORTED_TYPE,
        })
    }

    /// Writes a value, creating or overwriting it.
    pub fn set_value(&self, name: &str, value: &RegValue) -> Result<()> {
        let handle = self.raw_handle()?;
        let wide = wide_name(name)?;
        let raw = value.to_raw()?;
        self.backend
            .set_value(handle, &wide, &raw)
            .map_err(|status| RegistryError::from_status(status, self.context("RegSetValueEx", name)))?;
        debug!(key = %self.location, value = name, kind = %raw.kind, "Set value");
        Ok(())
    }

    /// Writes a DWORD value.
    pub fn set_dword(&self, name: &str, value: u32) -> Result<()> {
        self.set_value(name, &RegValue::Dword(value))
    }

    /// Writes a string value.
    pub fn set_string(&self, name: &str, value: &str) -> Result<()> {
        self.set_value(name, &RegValue::String(value.to_string()))
    }

    /// Writes an expandable string value. Placeholders are stored verbatim.
    pub fn set_expand_string(&self, name: &str, value: &str) -> Result<()> {
        self.set_value(name, &RegValue::ExpandString(value.to_string()))
    }

    /// Writes a multi-string value.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if an entry is empty or contains NUL.
    pub fn set_multi_string<S: AsRef<str>>(&self, name: &str, values: &[S]) -> Result<()> {
        let values = values.iter().map(|s| s.as_ref().to_string()).collect();
        self.set_value(name, &RegValue::MultiString(values))
    }

    /// Removes a value. Removing a value that does not exist succeeds.
    pub fn delete_value(&self, name: &str) -> Result<()> {
        let handle = self.raw_handle()?;
        let wide = wide_name(name)?;
        self.backend
            .delete_value(handle, &wide)
            .map_err(|status| RegistryError::from_status(status, self.context("RegDeleteValue", name)))
            .ignore_not_found()
    }

    /// Removes the subkey `path`, which must have no subkeys of its own.
    /// The view bits of `view` pick the 32- or 64-bit view.
    ///
    /// # Errors
    ///
    /// `NotFound` if the subkey does not exist.
    pub fn delete_key(&self, path: &str, view: Access) -> Result<()> {
        let handle = self.raw_handle()?;
        let wide = wide_path(path)?;
        if wide.is_empty() {
            return Err(RegistryError::invalid_argument("subkey path must not be empty"));
        }
        self.backend
            .delete_key(handle, &wide, view.view())
            .map_err(|status| RegistryError::from_status(status, self.context("RegDeleteKeyEx", path)))
    }

    /// Removes the subkey `path` with all of its subkeys and values. An
    /// empty `path` removes everything below this key but keeps the key.
    ///
    /// # Errors
    ///
    /// `NotFound` if the subkey does not exist.
    pub fn delete_tree(&self, path: &str) -> Result<()> {
        let handle = self.raw_handle()?;
        let wide = wide_path(path)?;
        self.backend
            .delete_tree(handle, &wide)
            .map_err(|status| RegistryError::from_status(status, self.context("RegDeleteTree", path)))
    }
}

impl<B: Backend + Clone> RegKey<B> {
    /// Creates or opens `path` relative to this key.
    pub fn create_sub_key(&self, path: &str, options: KeyOptions) -> Result<(Self, bool)> {
        let parent = self.raw_handle()?;
        let path = normalize_path(path);
        let location = join_location(&self.location, &path);
        let wide = WideString::new(&path)?;

        let (handle, created) = self
            .backend
            .create_key(parent, &wide, options.create_options, options.access)
            .map_err(|status| {
                RegistryError::from_status(status, format!("RegCreateKeyEx [{}]", location))
            })?;

        let mut key = Self::new(self.backend.clone());
        key.adopt(handle, options.access, location);
        Ok((key, created))
    }

    /// Opens an existing `path` relative to this key.
    pub fn open_sub_key(&self, path: &str, options: KeyOptions) -> Result<Self> {
        let parent = self.raw_handle()?;
        let path = normalize_path(path);
        let location = join_location(&self.location, &path);
        let wide = WideString::new(&path)?;

        let handle = self
            .backend
            .open_key(parent, &wide, options.access)
            .map_err(|status| {
                RegistryError::from_status(status, format!("RegOpenKeyEx [{}]", location))
            })?;

        let mut key = Self::new(self.backend.clone());
        key.adopt(handle, options.access, location);
        Ok(key)
    }
}

impl<B: Backend> Drop for RegKey<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: Backend> fmt::Debug for RegKey<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegKey")
            .field("location", &self.location)
            .field("handle", &self.handle)
            .field("access", &self.access)
            .finish()
    }
}

fn join_location(base: &str, path: &str) -> String {
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}\\{}", base, path)
    }
}
