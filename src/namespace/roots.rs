//! Namespace roots
//!
//! Owns the one-directory-per-user layout under the storage base and the
//! lazy creation of each user's root.

use std::path::PathBuf;

use log::info;

use crate::error::{ContainmentError, OpError, StorageError};
use crate::namespace::resolver;

/// A resolved path together with the canonical root it is confined to.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    /// Canonical namespace root of the user.
    pub root: PathBuf,
    /// Confined absolute target inside (or equal to) `root`.
    pub real: PathBuf,
}

impl ResolvedPath {
    /// Whether the target is the namespace root itself.
    pub fn is_root(&self) -> bool {
        self.real == self.root
    }
}

/// Per-user namespace directory management under a fixed base directory.
pub struct Namespace {
    base: PathBuf,
}

impl Namespace {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Pure lookup of a user's root: validates the identity and joins it
    /// onto the base directory. No filesystem access.
    pub fn root_for(&self, user_id: &str) -> Result<PathBuf, ContainmentError> {
        validate_user_id(user_id)?;
        Ok(self.base.join(user_id))
    }

    /// Creates the user's root directory (and parents) on first call;
    /// a no-op afterwards.
    pub fn ensure(&self, user_id: &str) -> Result<PathBuf, OpError> {
        let root = self.root_for(user_id)?;
        if !root.is_dir() {
            std::fs::create_dir_all(&root).map_err(StorageError::from)?;
            info!("Created namespace root for {} at {}", user_id, root.display());
        }
        Ok(root)
    }

    /// Ensures the user's root exists and resolves `relative_path`
    /// inside it.
    pub fn resolve(&self, user_id: &str, relative_path: &str) -> Result<ResolvedPath, OpError> {
        let root = self.ensure(user_id)?;
        let root = root.canonicalize().map_err(StorageError::from)?;
        let real = resolver::resolve(&root, relative_path)?;
        Ok(ResolvedPath { root, real })
    }
}

/// The user identity is the one untrusted segment the service itself
/// joins onto the storage base, so it gets the same class of check as a
/// relative path: non-empty, no separators, no parent references, no
/// NUL or line-control bytes.
fn validate_user_id(user_id: &str) -> Result<(), ContainmentError> {
    if user_id.trim().is_empty()
        || user_id == "."
        || user_id.contains("..")
        || user_id.contains(['/', '\\', '\0', '\r', '\n'])
    {
        return Err(ContainmentError::InvalidIdentity(user_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn root_for_is_pure_and_does_not_create() {
        let base = TempDir::new().unwrap();
        let ns = Namespace::new(base.path());
        let root = ns.root_for("alice").unwrap();
        assert_eq!(root, base.path().join("alice"));
        assert!(!root.exists());
    }

    #[test]
    fn ensure_is_idempotent() {
        let base = TempDir::new().unwrap();
        let ns = Namespace::new(base.path());
        let first = ns.ensure("alice").unwrap();
        assert!(first.is_dir());
        let second = ns.ensure("alice").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn malicious_identities_are_rejected_before_any_directory_is_touched() {
        let base = TempDir::new().unwrap();
        let ns = Namespace::new(base.path());
        for id in ["", "  ", ".", "..", "a/b", "a\\b", "../../etc", "a\0b", "a\nb"] {
            assert!(ns.root_for(id).is_err(), "{id:?} accepted");
        }
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[test]
    fn resolve_confines_to_the_user_root() {
        let base = TempDir::new().unwrap();
        let ns = Namespace::new(base.path());
        let resolved = ns.resolve("alice", "docs/a.txt").unwrap();
        assert!(resolved.real.starts_with(&resolved.root));
        assert!(!resolved.is_root());
        assert!(ns.resolve("alice", "").unwrap().is_root());
    }

    #[test]
    fn users_cannot_alias_each_other() {
        let base = TempDir::new().unwrap();
        let ns = Namespace::new(base.path());
        let alice = ns.resolve("alice", "").unwrap();
        let bob = ns.resolve("bob", "").unwrap();
        assert_ne!(alice.root, bob.root);
        assert!(!alice.root.starts_with(&bob.root));
    }
}
