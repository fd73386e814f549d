//! Error types
//!
//! Defines domain-specific error types for each module of the file service.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Containment violations detected while resolving caller-supplied paths
/// or user identities.
///
/// Every variant carries the offending caller-supplied string, never the
/// underlying storage location.
#[derive(Debug)]
pub enum ContainmentError {
    /// A `..` segment was present in the input, in any separator encoding.
    ParentReference(String),
    /// The resolved location fell outside the namespace root.
    Escape(String),
    /// A component could not be canonicalized (dangling symlink, symlink
    /// cycle, or an unreachable namespace root).
    Unresolvable(String),
    /// A single-segment name contained a separator, NUL, or was `.`/`..`.
    InvalidSegment(String),
    /// A user identity unfit for use as a directory name.
    InvalidIdentity(String),
}

impl fmt::Display for ContainmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainmentError::ParentReference(p) => {
                write!(f, "parent reference in path: {}", p)
            }
            ContainmentError::Escape(p) => write!(f, "path escapes namespace: {}", p),
            ContainmentError::Unresolvable(p) => write!(f, "path not resolvable: {}", p),
            ContainmentError::InvalidSegment(s) => write!(f, "invalid name: {}", s),
            ContainmentError::InvalidIdentity(u) => write!(f, "invalid user identity: {}", u),
        }
    }
}

impl std::error::Error for ContainmentError {}

/// Storage module errors
///
/// `NotFound` and `AlreadyExists` carry the real path for server-side
/// logs; handlers compose client-visible messages from the virtual path
/// they already hold.
#[derive(Debug)]
pub enum StorageError {
    NotFound(PathBuf),
    AlreadyExists(PathBuf),
    Io(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(p) => write!(f, "not found: {}", p.display()),
            StorageError::AlreadyExists(p) => write!(f, "already exists: {}", p.display()),
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::Io(error)
    }
}

/// Authentication module errors
#[derive(Debug)]
pub enum AuthError {
    InvalidCredentials(String),
    MalformedInput(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials(u) => write!(f, "invalid credentials for: {}", u),
            AuthError::MalformedInput(s) => write!(f, "malformed input: {}", s),
        }
    }
}

impl std::error::Error for AuthError {}

/// Umbrella error for a single file operation, as surfaced to the
/// operation handlers.
#[derive(Debug)]
pub enum OpError {
    Containment(ContainmentError),
    Storage(StorageError),
    /// A required name or filename argument was missing or empty.
    InvalidArgument(String),
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpError::Containment(e) => write!(f, "containment error: {}", e),
            OpError::Storage(e) => write!(f, "storage error: {}", e),
            OpError::InvalidArgument(s) => write!(f, "invalid argument: {}", s),
        }
    }
}

impl std::error::Error for OpError {}

impl From<ContainmentError> for OpError {
    fn from(error: ContainmentError) -> Self {
        OpError::Containment(error)
    }
}

impl From<StorageError> for OpError {
    fn from(error: StorageError) -> Self {
        OpError::Storage(error)
    }
}
