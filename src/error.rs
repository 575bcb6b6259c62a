//! Error types for registry operations.
//!
//! Every host call made by this crate returns a raw [`Status`]. Before it
//! reaches a caller, that status is classified by
//! [`RegistryError::from_status`] into one of the stable [`ErrorKind`]s, so
//! callers can branch on the kind (or the numeric code) without matching
//! message text.

use crate::value::ValueKind;
use std::fmt;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Win32 status codes the crate classifies or emulates.
pub mod status {
    /// The operation completed successfully.
    pub const ERROR_SUCCESS: u32 = 0;
    /// The system cannot find the file (key or value) specified.
    pub const ERROR_FILE_NOT_FOUND: u32 = 2;
    /// The system cannot find the path specified.
    pub const ERROR_PATH_NOT_FOUND: u32 = 3;
    /// Access is denied.
    pub const ERROR_ACCESS_DENIED: u32 = 5;
    /// The handle is invalid.
    pub const ERROR_INVALID_HANDLE: u32 = 6;
    /// The data is invalid.
    pub const ERROR_INVALID_DATA: u32 = 13;
    /// The parameter is incorrect.
    pub const ERROR_INVALID_PARAMETER: u32 = 87;
    /// More data is available.
    pub const ERROR_MORE_DATA: u32 = 234;
    /// No more data is available.
    pub const ERROR_NO_MORE_ITEMS: u32 = 259;
    /// Illegal operation attempted on a registry key that has been marked for deletion.
    pub const ERROR_KEY_DELETED: u32 = 1018;
    /// Cannot create a stable subkey under a volatile parent key.
    pub const ERROR_CHILD_MUST_BE_VOLATILE: u32 = 1021;
    /// The data is of an unsupported type.
    pub const ERROR_UNSUPPORTED_TYPE: u32 = 1630;
}

/// Raw numeric status returned by a host call.
///
/// Only [`Backend`](crate::backend::Backend) implementations produce these;
/// the rest of the crate turns them into [`RegistryError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub u32);

impl Status {
    /// Returns true for the statuses the host uses to say "does not exist".
    pub fn is_not_found(self) -> bool {
        matches!(self.0, status::ERROR_FILE_NOT_FOUND | status::ERROR_PATH_NOT_FOUND)
    }

    /// Short description of well-known statuses.
    pub fn description(self) -> &'static str {
        match self.0 {
            status::ERROR_SUCCESS => "the operation completed successfully",
            status::ERROR_FILE_NOT_FOUND => "the system cannot find the file specified",
            status::ERROR_PATH_NOT_FOUND => "the system cannot find the path specified",
            status::ERROR_ACCESS_DENIED => "access is denied",
            status::ERROR_INVALID_HANDLE => "the handle is invalid",
            status::ERROR_INVALID_DATA => "the data is invalid",
            status::ERROR_INVALID_PARAMETER => "the parameter is incorrect",
            status::ERROR_MORE_DATA => "more data is available",
            status::ERROR_NO_MORE_ITEMS => "no more data is available",
            status::ERROR_KEY_DELETED => "the key has been marked for deletion",
            status::ERROR_CHILD_MUST_BE_VOLATILE => {
                "cannot create a stable subkey under a volatile parent key"
            }
            status::ERROR_UNSUPPORTED_TYPE => "the data is of an unsupported type",
            _ => "host operation failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.description(), self.0)
    }
}

fn status_of(code: &u32) -> Status {
    Status(*code)
}

/// Stable classification of every error the crate reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The key or value does not exist.
    NotFound,
    /// Any other non-zero host status.
    HostFailure,
    /// The caller supplied an unusable argument; no host call was made.
    InvalidArgument,
    /// The handle is closed or was never opened; no host call was made.
    InvalidHandle,
}

/// Errors that can occur during registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Key or value not found.
    #[error("Not found: {context}: {}", status_of(.code))]
    NotFound {
        /// What was being accessed.
        context: String,
        /// Host status that reported the absence.
        code: u32,
    },

    /// The stored value is not of the requested kind.
    #[error("Type mismatch for value '{name}': expected {}, found {}", .expected.name(), .found.name())]
    TypeMismatch {
        /// Value name.
        name: String,
        /// Kind the caller asked for.
        expected: ValueKind,
        /// Kind actually stored.
        found: ValueKind,
    },

    /// The host reported a failure other than "not found".
    #[error("{context} failed: {}", status_of(.code))]
    Host {
        /// Host operation and target.
        context: String,
        /// Host status code.
        code: u32,
    },

    /// The caller supplied an argument that cannot be passed to the host.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation attempted on a closed or never-opened handle.
    #[error("Invalid handle: the key is not open")]
    InvalidHandle,
}

impl RegistryError {
    /// Classifies a raw host status.
    ///
    /// # Arguments
    ///
    /// * `status` - Status returned by the host
    /// * `context` - Operation and target, e.g. `"RegOpenKeyEx HKEY_CURRENT_USER\\App"`
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use regkey::error::{status, ErrorKind, RegistryError, Status};
    /// let err = RegistryError::from_status(Status(status::ERROR_FILE_NOT_FOUND), "open App");
    /// assert_eq!(err.kind(), ErrorKind::NotFound);
    /// assert_eq!(err.code(), 2);
    /// ```
    pub fn from_status(status: Status, context: impl Into<String>) -> Self {
        if status.is_not_found() {
            Self::NotFound {
                context: context.into(),
                code: status.0,
            }
        } else {
            Self::Host {
                context: context.into(),
                code: status.0,
            }
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates an error for a payload the host returned that cannot be decoded.
    pub fn invalid_data(context: impl Into<String>) -> Self {
        Self::Host {
            context: context.into(),
            code: status::ERROR_INVALID_DATA,
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(name: &str, expected: ValueKind, found: ValueKind) -> Self {
        Self::TypeMismatch {
            name: name.to_string(),
            expected,
            found,
        }
    }

    /// Returns the stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TypeMismatch { .. } | Self::Host { .. } => ErrorKind::HostFailure,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InvalidHandle => ErrorKind::InvalidHandle,
        }
    }

    /// Returns the numeric host status, or `0` for errors detected locally.
    pub fn code(&self) -> u32 {
        match self {
            Self::NotFound { code, .. } | Self::Host { code, .. } => *code,
            Self::TypeMismatch { .. } => status::ERROR_UNSUPPORTED_TYPE,
            Self::InvalidArgument(_) | Self::InvalidHandle => status::ERROR_SUCCESS,
        }
    }

    /// Returns true if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Extension methods for results carrying a [`RegistryError`].
pub trait ResultExt<T> {
    /// Maps a `NotFound` error to `Ok(None)`; every other error is kept.
    fn optional(self) -> Result<Option<T>>;

    /// Maps a `NotFound` error to `Ok(())`-style success for operations with
    /// no payload, e.g. deleting something that is already gone.
    fn ignore_not_found(self) -> Result<()>;
}

impl<T> ResultExt<T> for Result<T> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn ignore_not_found(self) -> Result<()> {
        self.optional().map(|_| ())
    }
}
