//! Sandbox path resolution
//!
//! Resolves a caller-supplied relative path against a namespace root and
//! guarantees the result stays inside that root, including against `..`
//! segments, absolute-looking input, separator-encoding tricks, and
//! symlinks that point out of the namespace.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ContainmentError;

/// Resolves `relative_path` against `root` and returns the confined
/// absolute location.
///
/// Parent-reference segments are rejected before any normalization, so a
/// `..` can never be collapsed away by a later step. `.` and empty
/// segments are dropped, the remainder is joined onto the root, and the
/// candidate is canonicalized before a component-wise containment check
/// against the canonicalized root. For a candidate that does not exist
/// yet, the deepest existing ancestor is canonicalized and the pending
/// tail re-attached before the comparison.
///
/// An empty `relative_path` resolves to the root itself.
pub fn resolve(root: &Path, relative_path: &str) -> Result<PathBuf, ContainmentError> {
    let segments = split_segments(relative_path)?;

    let root = root
        .canonicalize()
        .map_err(|_| ContainmentError::Unresolvable(relative_path.to_string()))?;

    let mut candidate = root.clone();
    for segment in &segments {
        candidate.push(segment);
    }

    let resolved = canonicalize_pending(&candidate)
        .map_err(|_| ContainmentError::Unresolvable(relative_path.to_string()))?;

    // Component-wise comparison: a sibling such as `root-evil` does not
    // match `root`, and equality with the root itself is allowed.
    if resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(ContainmentError::Escape(relative_path.to_string()))
    }
}

/// Validates a single directory-entry name: exactly one path segment,
/// no separators in any encoding, no NUL, not `.` or `..`.
pub fn validate_entry_name(name: &str) -> Result<(), ContainmentError> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(ContainmentError::InvalidSegment(name.to_string()));
    }
    Ok(())
}

/// Splits the input on both separator encodings and rejects `..` before
/// any other processing sees it.
fn split_segments(relative_path: &str) -> Result<Vec<&str>, ContainmentError> {
    let mut segments = Vec::new();
    for segment in relative_path.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(ContainmentError::ParentReference(relative_path.to_string()));
            }
            _ if segment.contains('\0') => {
                return Err(ContainmentError::InvalidSegment(relative_path.to_string()));
            }
            _ => segments.push(segment),
        }
    }
    Ok(segments)
}

/// Canonicalizes `candidate`, tolerating a tail that does not exist yet.
///
/// Walks up to the deepest ancestor present on disk, canonicalizes it,
/// then re-attaches the pending components. An entry that exists but
/// cannot be canonicalized (dangling symlink, symlink cycle) is an
/// error, not a pass-through.
fn canonicalize_pending(candidate: &Path) -> io::Result<PathBuf> {
    let mut existing = candidate.to_path_buf();
    let mut pending: Vec<OsString> = Vec::new();

    loop {
        if existing.symlink_metadata().is_ok() {
            let mut resolved = existing.canonicalize()?;
            for name in pending.iter().rev() {
                resolved.push(name);
            }
            return Ok(resolved);
        }

        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                pending.push(name.to_os_string());
                existing = parent.to_path_buf();
            }
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no existing ancestor",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, PathBuf) {
        let base = TempDir::new().unwrap();
        let root = base.path().join("alice");
        fs::create_dir_all(&root).unwrap();
        (base, root)
    }

    #[test]
    fn empty_path_resolves_to_root() {
        let (_base, root) = sandbox();
        let resolved = resolve(&root, "").unwrap();
        assert_eq!(resolved, root.canonicalize().unwrap());
    }

    #[test]
    fn pending_path_stays_inside_root() {
        let (_base, root) = sandbox();
        let resolved = resolve(&root, "docs/a.txt").unwrap();
        assert_eq!(resolved, root.canonicalize().unwrap().join("docs/a.txt"));
    }

    #[test]
    fn dot_segments_and_trailing_separators_collapse() {
        let (_base, root) = sandbox();
        let canonical = root.canonicalize().unwrap();
        assert_eq!(resolve(&root, "./docs/./a.txt").unwrap(), canonical.join("docs/a.txt"));
        assert_eq!(resolve(&root, "docs/").unwrap(), canonical.join("docs"));
        assert_eq!(resolve(&root, "docs//sub").unwrap(), canonical.join("docs/sub"));
        assert_eq!(resolve(&root, ".").unwrap(), canonical);
    }

    #[test]
    fn absolute_looking_input_is_treated_as_relative() {
        let (_base, root) = sandbox();
        let resolved = resolve(&root, "/etc/passwd").unwrap();
        assert_eq!(resolved, root.canonicalize().unwrap().join("etc/passwd"));
    }

    #[test]
    fn parent_reference_is_rejected_in_any_position() {
        let (_base, root) = sandbox();
        for path in ["..", "../x", "a/../b", "a/..", "../../etc/passwd", "a/b/.."] {
            match resolve(&root, path) {
                Err(ContainmentError::ParentReference(_)) => {}
                other => panic!("{path:?} resolved to {other:?}"),
            }
        }
    }

    #[test]
    fn parent_reference_is_rejected_in_backslash_encoding() {
        let (_base, root) = sandbox();
        for path in ["..\\x", "a\\..\\b", "a/..\\b", "..\\..\\etc\\passwd"] {
            match resolve(&root, path) {
                Err(ContainmentError::ParentReference(_)) => {}
                other => panic!("{path:?} resolved to {other:?}"),
            }
        }
    }

    #[test]
    fn nul_byte_in_segment_is_rejected() {
        let (_base, root) = sandbox();
        assert!(matches!(
            resolve(&root, "docs/a\0.txt"),
            Err(ContainmentError::InvalidSegment(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_the_root_is_rejected() {
        let (base, root) = sandbox();
        let outside = base.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        assert!(matches!(
            resolve(&root, "link"),
            Err(ContainmentError::Escape(_))
        ));
        // A pending tail under the escaping symlink must fail too.
        assert!(matches!(
            resolve(&root, "link/new.txt"),
            Err(ContainmentError::Escape(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_staying_inside_the_root_resolves_to_its_target() {
        let (_base, root) = sandbox();
        let docs = root.join("docs");
        fs::create_dir_all(&docs).unwrap();
        std::os::unix::fs::symlink(&docs, root.join("shortcut")).unwrap();

        let resolved = resolve(&root, "shortcut").unwrap();
        assert_eq!(resolved, docs.canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_rejected_as_unresolvable() {
        let (base, root) = sandbox();
        std::os::unix::fs::symlink(base.path().join("gone"), root.join("link")).unwrap();

        assert!(matches!(
            resolve(&root, "link"),
            Err(ContainmentError::Unresolvable(_))
        ));
    }

    #[test]
    fn sibling_directory_with_root_prefix_is_not_contained() {
        let base = TempDir::new().unwrap();
        let root = base.path().join("data");
        let evil = base.path().join("data-evil");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&evil).unwrap();

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(&evil, root.join("link")).unwrap();
            assert!(matches!(
                resolve(&root, "link"),
                Err(ContainmentError::Escape(_))
            ));
        }
    }

    #[test]
    fn missing_root_is_unresolvable() {
        let base = TempDir::new().unwrap();
        let root = base.path().join("never-created");
        assert!(matches!(
            resolve(&root, "docs"),
            Err(ContainmentError::Unresolvable(_))
        ));
    }

    #[test]
    fn entry_names_are_single_safe_segments() {
        assert!(validate_entry_name("a.txt").is_ok());
        assert!(validate_entry_name("foo..bar").is_ok());
        for name in ["", ".", "..", "a/b", "a\\b", "a\0b"] {
            assert!(validate_entry_name(name).is_err(), "{name:?} accepted");
        }
    }
}
