//! In-process store that behaves like the host registry.
//!
//! Names compare case-insensitively and keep the case they were created
//! with. Subkeys enumerate in case-insensitive name order, values in the
//! order they were first written. Failures carry the same Win32 statuses
//! the host returns, including access checks against the mask a handle was
//! opened with.

use super::{Backend, HostResult};
use crate::encoding::{from_wide, to_wide, WideString, PATH_SEPARATOR};
use crate::enumerate::{filetime_now, KeyInfo};
use crate::error::{status, Status};
use crate::options::{Access, CreateOptions};
use crate::root::RootKey;
use crate::value::{RawValue, ValueKind};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Longest key name segment the host accepts, in characters.
const MAX_KEY_NAME_LEN: usize = 255;

/// Handle into a [`MemoryBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryHandle {
    /// Predefined root.
    Root(RootKey),
    /// Key opened through `create_key` or `open_key`.
    Key(u64),
}

/// Shared in-memory store. Clones refer to the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<MemoryStore>>,
}

#[derive(Debug)]
struct MemoryStore {
    roots: BTreeMap<RootKey, Node>,
    handles: HashMap<u64, OpenKey>,
    next_handle: u64,
    environment: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct OpenKey {
    root: RootKey,
    /// Folded segments from the root.
    path: Vec<String>,
    access: Access,
}

#[derive(Debug, Default)]
struct Node {
    volatile: bool,
    values: Vec<(String, RawValue)>,
    /// Folded name -> (display name, node).
    children: BTreeMap<String, (String, Node)>,
    last_written: u64,
}

impl Node {
    fn new(volatile: bool) -> Self {
        Self {
            volatile,
            last_written: filetime_now(),
            ..Self::default()
        }
    }

    fn child(&self, segments: &[String]) -> Option<&Node> {
        segments
            .iter()
            .try_fold(self, |node, seg| node.children.get(seg).map(|(_, n)| n))
    }

    fn child_mut(&mut self, segments: &[String]) -> Option<&mut Node> {
        segments
            .iter()
            .try_fold(self, |node, seg| node.children.get_mut(seg).map(|(_, n)| n))
    }

    fn value_index(&self, name: &str) -> Option<usize> {
        let folded = fold(name);
        self.values.iter().position(|(n, _)| fold(n) == folded)
    }

    fn touch(&mut self) {
        self.last_written = filetime_now();
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

fn decode(wide: &WideString) -> HostResult<String> {
    from_wide(wide.as_units()).map_err(|_| Status(status::ERROR_INVALID_PARAMETER))
}

fn split_segments(path: &str) -> HostResult<Vec<String>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<String> = path.split(PATH_SEPARATOR).map(str::to_string).collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || s.chars().count() > MAX_KEY_NAME_LEN)
    {
        return Err(Status(status::ERROR_INVALID_PARAMETER));
    }
    Ok(segments)
}

fn require(granted: Access, needed: Access) -> HostResult<()> {
    if granted.contains(needed) {
        Ok(())
    } else {
        Err(Status(status::ERROR_ACCESS_DENIED))
    }
}

fn expand_placeholders(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => {
                let name = &after[..end];
                match Some(name).filter(|n| !n.is_empty()).and_then(&lookup) {
                    Some(value) => {
                        out.push_str(&value);
                        rest = &after[end + 1..];
                    }
                    None => {
                        // Unresolved: the closing '%' may open the next name.
                        out.push('%');
                        out.push_str(name);
                        rest = &after[end..];
                    }
                }
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

impl MemoryBackend {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a variable for placeholder expansion. Names are
    /// case-insensitive and shadow the process environment.
    pub fn set_env(&self, name: &str, value: &str) {
        self.write().environment.insert(fold(name), value.to_string());
    }

    /// Number of handles currently open (roots excluded).
    pub fn open_handles(&self) -> usize {
        self.read().handles.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            roots: RootKey::ALL
                .into_iter()
                .map(|root| (root, Node::new(false)))
                .collect(),
            handles: HashMap::new(),
            next_handle: 0,
            environment: HashMap::new(),
        }
    }
}

impl MemoryStore {
    fn resolve(&self, handle: MemoryHandle) -> HostResult<OpenKey> {
        match handle {
            MemoryHandle::Root(root) => Ok(OpenKey {
                root,
                path: Vec::new(),
                access: Access::ALL_ACCESS | Access::WOW64_64KEY,
            }),
            MemoryHandle::Key(id) => self
                .handles
                .get(&id)
                .cloned()
                .ok_or(Status(status::ERROR_INVALID_HANDLE)),
        }
    }

    fn node(&self, key: &OpenKey) -> HostResult<&Node> {
        self.roots
            .get(&key.root)
            .and_then(|root| root.child(&key.path))
            .ok_or(Status(status::ERROR_KEY_DELETED))
    }

    fn node_mut(&mut self, key: &OpenKey) -> HostResult<&mut Node> {
        self.roots
            .get_mut(&key.root)
            .and_then(|root| root.child_mut(&key.path))
            .ok_or(Status(status::ERROR_KEY_DELETED))
    }

    fn insert_handle(&mut self, key: OpenKey) -> MemoryHandle {
        self.next_handle += 1;
        let id = self.next_handle;
        self.handles.insert(id, key);
        MemoryHandle::Key(id)
    }

    fn joined(base: &OpenKey, path: &str, access: Access) -> HostResult<OpenKey> {
        let mut full = base.path.clone();
        full.extend(split_segments(path)?.iter().map(|s| fold(s)));
        Ok(OpenKey {
            root: base.root,
            path: full,
            access,
        })
    }
}

impl Backend for MemoryBackend {
    type Handle = MemoryHandle;

    fn root(&self, root: RootKey) -> MemoryHandle {
        MemoryHandle::Root(root)
    }

    fn create_key(
        &self,
        parent: MemoryHandle,
        path: &WideString,
        options: CreateOptions,
        access: Access,
    ) -> HostResult<(MemoryHandle, bool)> {
        let path = decode(path)?;
        let segments = split_segments(&path)?;
        let mut store = self.write();
        let base = store.resolve(parent)?;
        let target = MemoryStore::joined(&base, &path, access)?;

        let volatile = options.is_volatile();
        let mut node = store.node_mut(&base)?;
        let mut created = false;
        for segment in &segments {
            let folded = fold(segment);
            if !node.children.contains_key(&folded) {
                require(base.access, Access::CREATE_SUB_KEY)?;
                if node.volatile && !volatile {
                    return Err(Status(status::ERROR_CHILD_MUST_BE_VOLATILE));
                }
                node.touch();
                node.children
                    .insert(folded.clone(), (segment.clone(), Node::new(volatile)));
                created = true;
            } else {
                created = false;
            }
            node = match node.children.get_mut(&folded) {
                Some((_, child)) => child,
                None => return Err(Status(status::ERROR_KEY_DELETED)),
            };
        }

        debug!(path = %path, created, "memory: create key");
        Ok((store.insert_handle(target), created))
    }

    fn open_key(
        &self,
        parent: MemoryHandle,
        path: &WideString,
        access: Access,
    ) -> HostResult<MemoryHandle> {
        let path = decode(path)?;
        let mut store = self.write();
        let base = store.resolve(parent)?;
        store.node(&base)?;
        let target = MemoryStore::joined(&base, &path, access)?;
        let exists = store
            .roots
            .get(&target.root)
            .and_then(|root| root.child(&target.path))
            .is_some();
        if !exists {
            return Err(Status(status::ERROR_FILE_NOT_FOUND));
        }
        Ok(store.insert_handle(target))
    }

    fn close_key(&self, handle: MemoryHandle) -> HostResult<()> {
        match handle {
            MemoryHandle::Root(_) => Ok(()),
            MemoryHandle::Key(id) => self
                .write()
                .handles
                .remove(&id)
                .map(|_| ())
                .ok_or(Status(status::ERROR_INVALID_HANDLE)),
        }
    }

    fn query_value_kind(&self, handle: MemoryHandle, name: &WideString) -> HostResult<ValueKind> {
        self.query_value(handle, name).map(|raw| raw.kind)
    }

    fn query_value(&self, handle: MemoryHandle, name: &WideString) -> HostResult<RawValue> {
        let name = decode(name)?;
        let store = self.read();
        let key = store.resolve(handle)?;
        require(key.access, Access::QUERY_VALUE)?;
        let node = store.node(&key)?;
        node.value_index(&name)
            .map(|i| node.values[i].1.clone())
            .ok_or(Status(status::ERROR_FILE_NOT_FOUND))
    }

    fn set_value(&self, handle: MemoryHandle, name: &WideString, value: &RawValue) -> HostResult<()> {
        let name = decode(name)?;
        let mut store = self.write();
        let key = store.resolve(handle)?;
        require(key.access, Access::SET_VALUE)?;
        let node = store.node_mut(&key)?;
        match node.value_index(&name) {
            Some(i) => node.values[i].1 = value.clone(),
            None => node.values.push((name, value.clone())),
        }
        node.touch();
        Ok(())
    }

    fn delete_value(&self, handle: MemoryHandle, name: &WideString) -> HostResult<()> {
        let name = decode(name)?;
        let mut store = self.write();
        let key = store.resolve(handle)?;
        require(key.access, Access::SET_VALUE)?;
        let node = store.node_mut(&key)?;
        let index = node
            .value_index(&name)
            .ok_or(Status(status::ERROR_FILE_NOT_FOUND))?;
        node.values.remove(index);
        node.touch();
        Ok(())
    }

    fn delete_key(&self, parent: MemoryHandle, path: &WideString, _view: Access) -> HostResult<()> {
        let path = decode(path)?;
        if path.is_empty() {
            return Err(Status(status::ERROR_INVALID_PARAMETER));
        }
        let mut store = self.write();
        let base = store.resolve(parent)?;
        let target = MemoryStore::joined(&base, &path, Access::DELETE)?;
        let Some((leaf, parent_path)) = target.path.split_last() else {
            return Err(Status(status::ERROR_INVALID_PARAMETER));
        };
        let parent_key = OpenKey {
            root: target.root,
            path: parent_path.to_vec(),
            access: Access::DELETE,
        };

        let parent_node = store
            .node_mut(&parent_key)
            .map_err(|_| Status(status::ERROR_FILE_NOT_FOUND))?;
        let has_children = match parent_node.children.get(leaf) {
            None => return Err(Status(status::ERROR_FILE_NOT_FOUND)),
            Some((_, node)) => !node.children.is_empty(),
        };
        if has_children {
            return Err(Status(status::ERROR_ACCESS_DENIED));
        }

        parent_node.children.remove(leaf);
        parent_node.touch();
        debug!(path = %path, "memory: delete key");
        Ok(())
    }

    fn delete_tree(&self, handle: MemoryHandle, path: &WideString) -> HostResult<()> {
        let path = decode(path)?;
        let mut store = self.write();
        let key = store.resolve(handle)?;
        require(
            key.access,
            Access::DELETE | Access::ENUMERATE_SUB_KEYS | Access::QUERY_VALUE,
        )?;

        if path.is_empty() {
            let node = store.node_mut(&key)?;
            node.children.clear();
            node.values.clear();
            node.touch();
            return Ok(());
        }

        let target = MemoryStore::joined(&key, &path, key.access)?;
        let Some((leaf, parent_path)) = target.path.split_last() else {
            return Err(Status(status::ERROR_INVALID_PARAMETER));
        };
        let parent_key = OpenKey {
            root: target.root,
            path: parent_path.to_vec(),
            access: key.access,
        };
        let parent_node = store
            .node_mut(&parent_key)
            .map_err(|_| Status(status::ERROR_FILE_NOT_FOUND))?;
        parent_node
            .children
            .remove(leaf)
            .ok_or(Status(status::ERROR_FILE_NOT_FOUND))?;
        parent_node.touch();
        debug!(path = %path, "memory: delete tree");
        Ok(())
    }

    fn enum_sub_keys(&self, handle: MemoryHandle) -> HostResult<Vec<WideString>> {
        let store = self.read();
        let key = store.resolve(handle)?;
        require(key.access, Access::ENUMERATE_SUB_KEYS)?;
        Ok(store
            .node(&key)?
            .children
            .values()
            .map(|(name, _)| WideString::from_units(to_wide(name)))
            .collect())
    }

    fn enum_values(&self, handle: MemoryHandle) -> HostResult<Vec<(WideString, ValueKind)>> {
        let store = self.read();
        let key = store.resolve(handle)?;
        require(key.access, Access::QUERY_VALUE)?;
        Ok(store
            .node(&key)?
            .values
            .iter()
            .map(|(name, raw)| (WideString::from_units(to_wide(name)), raw.kind))
            .collect())
    }

    fn query_info(&self, handle: MemoryHandle) -> HostResult<KeyInfo> {
        let store = self.read();
        let key = store.resolve(handle)?;
        require(key.access, Access::QUERY_VALUE)?;
        let node = store.node(&key)?;

        let utf16_len = |s: &str| s.encode_utf16().count() as u32;
        Ok(KeyInfo {
            sub_keys: node.children.len() as u32,
            values: node.values.len() as u32,
            max_sub_key_len: node
                .children
                .values()
                .map(|(name, _)| utf16_len(name))
                .max()
                .unwrap_or(0),
            max_value_name_len: node
                .values
                .iter()
                .map(|(name, _)| utf16_len(name))
                .max()
                .unwrap_or(0),
            max_value_len: node
                .values
                .iter()
                .map(|(_, raw)| raw.data.len() as u32)
                .max()
                .unwrap_or(0),
            last_written: node.last_written,
        })
    }

    fn expand_environment(&self, text: &WideString) -> HostResult<WideString> {
        let text = decode(text)?;
        let store = self.read();
        let expanded = expand_placeholders(&text, |name| {
            store
                .environment
                .get(&fold(name))
                .cloned()
                .or_else(|| env::var(name).ok())
        });
        Ok(WideString::from_units(to_wide(&expanded)))
    }
}
