//! Win32 registry API backend.

use super::{Backend, HostResult};
use crate::encoding::WideString;
use crate::enumerate::KeyInfo;
use crate::error::Status;
use crate::options::{Access, CreateOptions};
use crate::root::RootKey;
use crate::value::{RawValue, ValueKind};
use std::ptr;
use tracing::debug;
use windows_sys::Win32::Foundation::{
    ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, FILETIME, WIN32_ERROR,
};
use windows_sys::Win32::System::Environment::ExpandEnvironmentStringsW;
use windows_sys::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExW, RegDeleteKeyExW, RegDeleteTreeW, RegDeleteValueW,
    RegEnumKeyExW, RegEnumValueW, RegOpenKeyExW, RegQueryInfoKeyW, RegQueryValueExW,
    RegSetValueExW, HKEY, HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER,
    HKEY_LOCAL_MACHINE, HKEY_USERS, REG_CREATED_NEW_KEY,
};

/// Key names are at most 255 characters plus the terminator.
const MAX_KEY_NAME_UNITS: usize = 256;

/// Value names are at most 16383 characters plus the terminator.
const MAX_VALUE_NAME_UNITS: usize = 16_384;

/// Backend that talks to the live Windows registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl NativeBackend {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

fn check(rc: WIN32_ERROR) -> HostResult<()> {
    if rc == ERROR_SUCCESS {
        Ok(())
    } else {
        Err(Status(rc))
    }
}

fn filetime_to_u64(ft: &FILETIME) -> u64 {
    (u64::from(ft.dwHighDateTime) << 32) | u64::from(ft.dwLowDateTime)
}

fn empty_filetime() -> FILETIME {
    FILETIME {
        dwLowDateTime: 0,
        dwHighDateTime: 0,
    }
}

impl Backend for NativeBackend {
    type Handle = HKEY;

    fn root(&self, root: RootKey) -> HKEY {
        match root {
            RootKey::ClassesRoot => HKEY_CLASSES_ROOT,
            RootKey::CurrentUser => HKEY_CURRENT_USER,
            RootKey::LocalMachine => HKEY_LOCAL_MACHINE,
            RootKey::Users => HKEY_USERS,
            RootKey::CurrentConfig => HKEY_CURRENT_CONFIG,
        }
    }

    fn create_key(
        &self,
        parent: HKEY,
        path: &WideString,
        options: CreateOptions,
        access: Access,
    ) -> HostResult<(HKEY, bool)> {
        let mut handle: HKEY = ptr::null_mut();
        let mut disposition = 0u32;
        // SAFETY: `path` is NUL-terminated and outlives the call; out-pointers
        // refer to locals.
        let rc = unsafe {
            RegCreateKeyExW(
                parent,
                path.as_ptr(),
                0,
                ptr::null(),
                options.bits(),
                access.bits(),
                ptr::null(),
                &mut handle,
                &mut disposition,
            )
        };
        check(rc)?;
        Ok((handle, disposition == REG_CREATED_NEW_KEY))
    }

    fn open_key(&self, parent: HKEY, path: &WideString, access: Access) -> HostResult<HKEY> {
        let mut handle: HKEY = ptr::null_mut();
        // SAFETY: as in `create_key`.
        let rc = unsafe { RegOpenKeyExW(parent, path.as_ptr(), 0, access.bits(), &mut handle) };
        check(rc)?;
        Ok(handle)
    }

    fn close_key(&self, handle: HKEY) -> HostResult<()> {
        // SAFETY: the handle came from RegCreateKeyExW/RegOpenKeyExW and is
        // closed once.
        check(unsafe { RegCloseKey(handle) })
    }

    fn query_value_kind(&self, handle: HKEY, name: &WideString) -> HostResult<ValueKind> {
        let mut kind = 0u32;
        // SAFETY: a null data pointer asks for the type only.
        let rc = unsafe {
            RegQueryValueExW(
                handle,
                name.as_ptr(),
                ptr::null(),
                &mut kind,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        check(rc)?;
        Ok(ValueKind::from_u32(kind))
    }

    fn query_value(&self, handle: HKEY, name: &WideString) -> HostResult<RawValue> {
        let mut kind = 0u32;
        let mut size = 0u32;
        // SAFETY: first call sizes the buffer.
        let rc = unsafe {
            RegQueryValueExW(
                handle,
                name.as_ptr(),
                ptr::null(),
                &mut kind,
                ptr::null_mut(),
                &mut size,
            )
        };
        check(rc)?;

        // The value can grow between the two calls.
        loop {
            let mut data = vec![0u8; size as usize];
            // SAFETY: `data` holds `size` bytes.
            let rc = unsafe {
                RegQueryValueExW(
                    handle,
                    name.as_ptr(),
                    ptr::null(),
                    &mut kind,
                    data.as_mut_ptr(),
                    &mut size,
                )
            };
            match rc {
                ERROR_SUCCESS => {
                    data.truncate(size as usize);
                    return Ok(RawValue::new(ValueKind::from_u32(kind), data));
                }
                ERROR_MORE_DATA => continue,
                other => return Err(Status(other)),
            }
        }
    }

    fn set_value(&self, handle: HKEY, name: &WideString, value: &RawValue) -> HostResult<()> {
        let len = u32::try_from(value.data.len())
            .map_err(|_| Status(windows_sys::Win32::Foundation::ERROR_INVALID_PARAMETER))?;
        // SAFETY: `value.data` is `len` bytes long.
        let rc = unsafe {
            RegSetValueExW(
                handle,
                name.as_ptr(),
                0,
                value.kind.as_u32(),
                value.data.as_ptr(),
                len,
            )
        };
        check(rc)
    }

    fn delete_value(&self, handle: HKEY, name: &WideString) -> HostResult<()> {
        // SAFETY: `name` is NUL-terminated.
        check(unsafe { RegDeleteValueW(handle, name.as_ptr()) })
    }

    fn delete_key(&self, parent: HKEY, path: &WideString, view: Access) -> HostResult<()> {
        // SAFETY: `path` is NUL-terminated.
        let rc = unsafe { RegDeleteKeyExW(parent, path.as_ptr(), view.view().bits(), 0) };
        check(rc)?;
        debug!(view = %view, "RegDeleteKeyExW");
        Ok(())
    }

    fn delete_tree(&self, handle: HKEY, path: &WideString) -> HostResult<()> {
        let sub_key = if path.is_empty() {
            ptr::null()
        } else {
            path.as_ptr()
        };
        // SAFETY: a null subkey clears the contents of `handle` itself.
        check(unsafe { RegDeleteTreeW(handle, sub_key) })
    }

    fn enum_sub_keys(&self, handle: HKEY) -> HostResult<Vec<WideString>> {
        let mut names = Vec::new();
        let mut buffer = vec![0u16; MAX_KEY_NAME_UNITS];

        let mut index = 0u32;
        loop {
            let mut len = buffer.len() as u32;
            // SAFETY: `buffer` holds `len` units.
            let rc = unsafe {
                RegEnumKeyExW(
                    handle,
                    index,
                    buffer.as_mut_ptr(),
                    &mut len,
                    ptr::null(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                )
            };
            match rc {
                ERROR_SUCCESS => {
                    names.push(WideString::from_units(buffer[..len as usize].to_vec()));
                    index += 1;
                }
                ERROR_NO_MORE_ITEMS => break,
                ERROR_MORE_DATA => buffer.resize(buffer.len() * 2, 0),
                other => return Err(Status(other)),
            }
        }
        Ok(names)
    }

    fn enum_values(&self, handle: HKEY) -> HostResult<Vec<(WideString, ValueKind)>> {
        let mut values = Vec::new();
        let mut buffer = vec![0u16; MAX_VALUE_NAME_UNITS];

        let mut index = 0u32;
        loop {
            let mut len = buffer.len() as u32;
            let mut kind = 0u32;
            // SAFETY: `buffer` holds `len` units; data is not requested.
            let rc = unsafe {
                RegEnumValueW(
                    handle,
                    index,
                    buffer.as_mut_ptr(),
                    &mut len,
                    ptr::null(),
                    &mut kind,
                    ptr::null_mut(),
                    ptr::null_mut(),
                )
            };
            match rc {
                ERROR_SUCCESS => {
                    values.push((
                        WideString::from_units(buffer[..len as usize].to_vec()),
                        ValueKind::from_u32(kind),
                    ));
                    index += 1;
                }
                ERROR_NO_MORE_ITEMS => break,
                ERROR_MORE_DATA => buffer.resize(buffer.len() * 2, 0),
                other => return Err(Status(other)),
            }
        }
        Ok(values)
    }

    fn query_info(&self, handle: HKEY) -> HostResult<KeyInfo> {
        let mut info = KeyInfo::default();
        let mut last_written = empty_filetime();
        // SAFETY: every out-pointer refers to a local.
        let rc = unsafe {
            RegQueryInfoKeyW(
                handle,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null(),
                &mut info.sub_keys,
                &mut info.max_sub_key_len,
                ptr::null_mut(),
                &mut info.values,
                &mut info.max_value_name_len,
                &mut info.max_value_len,
                ptr::null_mut(),
                &mut last_written,
            )
        };
        check(rc)?;
        info.last_written = filetime_to_u64(&last_written);
        Ok(info)
    }

    fn expand_environment(&self, text: &WideString) -> HostResult<WideString> {
        let mut buffer = vec![0u16; text.as_units().len().max(64)];
        loop {
            // SAFETY: `buffer` holds `buffer.len()` units.
            let needed = unsafe {
                ExpandEnvironmentStringsW(text.as_ptr(), buffer.as_mut_ptr(), buffer.len() as u32)
            };
            if needed == 0 {
                let code = std::io::Error::last_os_error()
                    .raw_os_error()
                    .map_or(0, |c| c as u32);
                return Err(Status(code));
            }
            if (needed as usize) <= buffer.len() {
                buffer.truncate(needed as usize);
                return Ok(WideString::from_units(buffer));
            }
            buffer.resize(needed as usize, 0);
        }
    }
}
