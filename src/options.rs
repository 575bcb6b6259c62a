//! Access rights, creation options and the configuration passed when a key
//! is created or opened.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Access mask requested when opening or creating a key.
///
/// Values are the host's bit values and are passed through unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Access(pub u32);

impl Access {
    /// Query values.
    pub const QUERY_VALUE: Access = Access(0x0001);

    /// Create, overwrite or delete values.
    pub const SET_VALUE: Access = Access(0x0002);

    /// Create subkeys.
    pub const CREATE_SUB_KEY: Access = Access(0x0004);

    /// Enumerate subkeys.
    pub const ENUMERATE_SUB_KEYS: Access = Access(0x0008);

    /// Request change notifications.
    pub const NOTIFY: Access = Access(0x0010);

    /// Reserved for system use.
    pub const CREATE_LINK: Access = Access(0x0020);

    /// Operate on the 64-bit view from a 32-bit process.
    pub const WOW64_64KEY: Access = Access(0x0100);

    /// Operate on the 32-bit view from a 64-bit process.
    pub const WOW64_32KEY: Access = Access(0x0200);

    /// Delete the key.
    pub const DELETE: Access = Access(0x0001_0000);

    /// Read the security descriptor.
    pub const READ_CONTROL: Access = Access(0x0002_0000);

    /// `KEY_READ`: query, enumerate, notify.
    pub const READ: Access = Access(0x0002_0019);

    /// `KEY_WRITE`: set values, create subkeys.
    pub const WRITE: Access = Access(0x0002_0006);

    /// `KEY_ALL_ACCESS`.
    pub const ALL_ACCESS: Access = Access(0x000F_003F);

    const VIEW_MASK: u32 = 0x0300;

    /// Returns the raw mask.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    pub fn contains(self, other: Access) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns only the view selector bits.
    pub fn view(self) -> Access {
        Access(self.0 & Self::VIEW_MASK)
    }
}

impl BitOr for Access {
    type Output = Access;

    fn bitor(self, rhs: Access) -> Access {
        Access(self.0 | rhs.0)
    }
}

impl BitOrAssign for Access {
    fn bitor_assign(&mut self, rhs: Access) {
        self.0 |= rhs.0;
    }
}

impl From<u32> for Access {
    fn from(bits: u32) -> Self {
        Access(bits)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Options applied when a key is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CreateOptions(pub u32);

impl CreateOptions {
    /// The key is persisted (`REG_OPTION_NON_VOLATILE`).
    pub const NON_VOLATILE: CreateOptions = CreateOptions(0x0000);

    /// The key lives in memory only (`REG_OPTION_VOLATILE`).
    pub const VOLATILE: CreateOptions = CreateOptions(0x0001);

    /// Returns the raw value.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if the key is not persisted.
    pub fn is_volatile(self) -> bool {
        (self.0 & Self::VOLATILE.0) != 0
    }
}

/// Configuration for [`RegKey::create`](crate::RegKey::create) and
/// [`RegKey::open`](crate::RegKey::open).
///
/// ```rust
/// # use regkey::{Access, KeyOptions};
/// let opts = KeyOptions::write().with_access(Access::WOW64_64KEY);
/// assert!(opts.access.contains(Access::WRITE));
/// assert_eq!(opts.access.view(), Access::WOW64_64KEY);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyOptions {
    /// Requested access rights and view selector.
    pub access: Access,
    /// Creation options; ignored when opening.
    pub create_options: CreateOptions,
}

impl KeyOptions {
    /// Read access, the default for opening.
    pub fn read() -> Self {
        Self {
            access: Access::READ,
            create_options: CreateOptions::NON_VOLATILE,
        }
    }

    /// Read and write access, the default for creating.
    pub fn write() -> Self {
        Self {
            access: Access::READ | Access::WRITE,
            create_options: CreateOptions::NON_VOLATILE,
        }
    }

    /// Replaces the access mask.
    pub fn access(mut self, access: impl Into<Access>) -> Self {
        self.access = access.into();
        self
    }

    /// Adds bits to the access mask, e.g. a view selector.
    pub fn with_access(mut self, extra: impl Into<Access>) -> Self {
        self.access |= extra.into();
        self
    }

    /// Replaces the creation options.
    pub fn create_options(mut self, options: CreateOptions) -> Self {
        self.create_options = options;
        self
    }

    /// Creates the key as volatile.
    pub fn volatile(self) -> Self {
        self.create_options(CreateOptions::VOLATILE)
    }
}

/// Same as [`KeyOptions::read`], the default for opening.
///
/// Creating keys or writing values needs [`KeyOptions::write`].
impl Default for KeyOptions {
    fn default() -> Self {
        Self::read()
    }
}
