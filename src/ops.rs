//! One-shot operations that do not need a held-open key.
//!
//! Each function opens a private handle, performs a single read, write or
//! delete and closes the handle again before returning, on the error path
//! too. Paths may use either `\` or `/` as separator.

use crate::backend::Backend;
use crate::encoding::normalize_path;
use crate::error::{RegistryError, Result, ResultExt};
use crate::key::RegKey;
use crate::options::{Access, KeyOptions};
use crate::root::RootKey;
use crate::value::{ExpandMode, RegValue, ValueKind};
use tracing::{debug, instrument};

/// Reads a value without keeping the key open.
///
/// Integers come back as [`RegValue::Dword`]; both string kinds come back
/// as [`RegValue::String`], expandable strings already expanded. Returns
/// `None` when the key or value does not exist, and for every other kind.
///
/// # Arguments
///
/// * `backend` - Store to read from
/// * `root` - Root the path is relative to
/// * `path` - Key path, `\` or `/` separated
/// * `name` - Value name; empty for the default value
/// * `access_extra` - Extra access bits, typically a view selector
///
/// # Examples
///
/// ```rust
/// use regkey::{ops, Access, MemoryBackend, RegValue, RootKey};
///
/// # fn main() -> regkey::Result<()> {
/// let backend = MemoryBackend::new();
/// assert_eq!(ops::query(&backend, RootKey::CurrentUser, "App/Missing", "X", Access(0))?, None);
///
/// ops::set(&backend, RootKey::CurrentUser, "App", "Count", 5u32, Access(0))?;
/// let value = ops::query(&backend, RootKey::CurrentUser, "App", "Count", Access(0))?;
/// assert_eq!(value, Some(RegValue::Dword(5)));
/// # Ok(())
/// # }
/// ```
#[instrument(skip(backend))]
pub fn query<B: Backend + Clone>(
    backend: &B,
    root: RootKey,
    path: &str,
    name: &str,
    access_extra: Access,
) -> Result<Option<RegValue>> {
    let options = KeyOptions::read().with_access(access_extra);
    let Some(key) = RegKey::open_with(backend.clone(), root, path, options).optional()? else {
        debug!("Key does not exist");
        return Ok(None);
    };

    let Some(kind) = key.query_value_type(name).optional()? else {
        debug!("Value does not exist");
        return Ok(None);
    };

    let value = match kind {
        ValueKind::Dword => key.get_dword(name).optional()?.map(RegValue::Dword),
        ValueKind::String => key.get_string(name).optional()?.map(RegValue::String),
        ValueKind::ExpandString => key
            .get_expand_string(name, ExpandMode::Expand)
            .optional()?
            .map(RegValue::String),
        other => {
            debug!(kind = %other, "Value kind is not returned by query");
            None
        }
    };
    Ok(value)
}

/// Writes a value, creating the key (and any missing parents) first.
///
/// The stored kind follows the variant of `value`; plain integers and
/// strings convert through `Into<RegValue>`.
#[instrument(skip(backend, value))]
pub fn set<B: Backend + Clone>(
    backend: &B,
    root: RootKey,
    path: &str,
    name: &str,
    value: impl Into<RegValue>,
    access_extra: Access,
) -> Result<()> {
    let value = value.into();
    let options = KeyOptions::write().with_access(access_extra);
    let (key, created) = RegKey::create_with(backend.clone(), root, path, options)?;
    if created {
        debug!(key = %key.location(), "Created key for value");
    }
    key.set_value(name, &value)
}

/// Deletes a value, or with `name` of `None` the whole subtree at `path`.
///
/// A target that is already absent counts as success. A subtree delete
/// that fails part way reports the host failure; whatever the host already
/// removed stays removed.
///
/// # Errors
///
/// `InvalidArgument` when asked to delete a whole root (empty `path` and no
/// value name).
#[instrument(skip(backend))]
pub fn delete<B: Backend + Clone>(
    backend: &B,
    root: RootKey,
    path: &str,
    name: Option<&str>,
    access_extra: Access,
) -> Result<()> {
    match name {
        Some(name) => delete_value(backend, root, path, name, access_extra),
        None => delete_subtree(backend, root, path, access_extra),
    }
}

fn delete_value<B: Backend + Clone>(
    backend: &B,
    root: RootKey,
    path: &str,
    name: &str,
    access_extra: Access,
) -> Result<()> {
    let options = KeyOptions::read()
        .access(Access::QUERY_VALUE | Access::SET_VALUE)
        .with_access(access_extra);
    match RegKey::open_with(backend.clone(), root, path, options).optional()? {
        Some(key) => key.delete_value(name),
        None => Ok(()),
    }
}

fn delete_subtree<B: Backend + Clone>(
    backend: &B,
    root: RootKey,
    path: &str,
    access_extra: Access,
) -> Result<()> {
    let path = normalize_path(path);
    let Some((parent, leaf)) = split_leaf(&path) else {
        return Err(RegistryError::invalid_argument(format!(
            "refusing to delete root {}",
            root
        )));
    };

    let options = KeyOptions::read()
        .access(
            Access::DELETE | Access::ENUMERATE_SUB_KEYS | Access::QUERY_VALUE | Access::SET_VALUE,
        )
        .with_access(access_extra);
    match RegKey::open_with(backend.clone(), root, &path, options).optional()? {
        Some(target) => target.delete_tree("")?,
        None => {
            debug!(path = %path, "Subtree already absent");
            return Ok(());
        }
    }

    let options = KeyOptions::read().with_access(access_extra);
    let Some(parent) = RegKey::open_with(backend.clone(), root, parent, options).optional()? else {
        return Ok(());
    };
    parent
        .delete_key(leaf, access_extra.view())
        .ignore_not_found()?;
    debug!(key = %parent.location(), leaf, "Deleted subtree");
    Ok(())
}

fn split_leaf(path: &str) -> Option<(&str, &str)> {
    if path.is_empty() {
        return None;
    }
    Some(path.rsplit_once('\\').unwrap_or(("", path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::ErrorKind;

    #[test]
    fn test_split_leaf() {
        assert_eq!(split_leaf("a\\b\\c"), Some(("a\\b", "c")));
        assert_eq!(split_leaf("a"), Some(("", "a")));
        assert_eq!(split_leaf(""), None);
    }

    #[test]
    fn test_query_missing_is_absent() {
        let backend = MemoryBackend::new();
        let value = query(&backend, RootKey::CurrentUser, "App\\Missing", "X", Access(0)).unwrap();
        assert_eq!(value, None);
        assert_eq!(backend.open_handles(), 0);
    }

    #[test]
    fn test_query_multi_string_is_absent() {
        let backend = MemoryBackend::new();
        let value = RegValue::MultiString(vec!["a".into()]);
        set(&backend, RootKey::CurrentUser, "App", "List", value, Access(0)).unwrap();
        assert_eq!(
            query(&backend, RootKey::CurrentUser, "App", "List", Access(0)).unwrap(),
            None
        );
    }

    #[test]
    fn test_delete_root_refused() {
        let backend = MemoryBackend::new();
        let err = delete(&backend, RootKey::CurrentUser, "/", None, Access(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_delete_top_level_key() {
        let backend = MemoryBackend::new();
        set(&backend, RootKey::CurrentUser, "Top/Inner", "n", 1u32, Access(0)).unwrap();
        delete(&backend, RootKey::CurrentUser, "Top", None, Access(0)).unwrap();
        assert!(RegKey::open_with(backend.clone(), RootKey::CurrentUser, "Top", KeyOptions::read())
            .unwrap_err()
            .is_not_found());
        assert_eq!(backend.open_handles(), 0);
    }
}
