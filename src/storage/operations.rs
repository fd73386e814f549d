//! Storage operations
//!
//! File system primitives for the file service: list, create, delete,
//! rename, write, and open. Every function takes already-confined
//! absolute paths only.

use log::{error, info};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::StorageError;
use crate::storage::results::{DirEntry, EntryKind};

/// Lists the entries of a directory in filesystem order.
///
/// A directory that does not exist yields an empty listing, not an
/// error. Entries that are neither files nor directories are skipped.
pub fn list_directory(dir: &Path) -> Result<Vec<DirEntry>, StorageError> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            error!("Failed to list {}: {}", dir.display(), e);
            return Err(StorageError::Io(e));
        }
    };

    let mut entries = Vec::new();
    for entry in read {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let kind = if file_type.is_dir() {
            EntryKind::Folder
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            continue;
        };
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
        });
    }
    Ok(entries)
}

/// Creates a directory and any missing parents. Idempotent.
pub fn create_directory(dir: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| {
        error!("Failed to create directory {}: {}", dir.display(), e);
        StorageError::Io(e)
    })?;
    info!("Created directory {}", dir.display());
    Ok(())
}

/// Removes a file or directory tree. A missing target is a success, and
/// entries that vanish mid-delete are tolerated; partial failures during
/// a recursive delete are reported and not rolled back.
pub fn remove_entry(path: &Path) -> Result<(), StorageError> {
    let metadata = match path.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(StorageError::Io(e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => {
            info!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            error!("Failed to remove {}: {}", path.display(), e);
            Err(StorageError::Io(e))
        }
    }
}

/// Atomically renames `old` to `new` without replacing an existing
/// destination, even when raced: the check is the rename primitive
/// itself, not a separate existence probe.
pub fn rename_entry(old: &Path, new: &Path) -> Result<(), StorageError> {
    if old.symlink_metadata().is_err() {
        return Err(StorageError::NotFound(old.to_path_buf()));
    }

    match rename_noreplace(old, new) {
        Ok(()) => {
            info!("Renamed {} -> {}", old.display(), new.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            Err(StorageError::AlreadyExists(new.to_path_buf()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(StorageError::NotFound(old.to_path_buf()))
        }
        Err(e) => {
            error!(
                "Failed to rename {} -> {}: {}",
                old.display(),
                new.display(),
                e
            );
            Err(StorageError::Io(e))
        }
    }
}

/// Streams `reader` into `dir/file_name`, creating the directory if
/// missing. The content goes to a temporary sibling first and is renamed
/// into place, so a failed upload never leaves a truncated destination
/// and concurrent uploads are last-writer-wins without interleaving.
pub fn write_file(
    dir: &Path,
    file_name: &str,
    reader: &mut dyn Read,
) -> Result<u64, StorageError> {
    fs::create_dir_all(dir)?;

    let final_path = dir.join(file_name);
    let temp_path = dir.join(format!("{file_name}.part"));

    let mut temp_file = File::create(&temp_path)?;
    let written = io::copy(reader, &mut temp_file)
        .and_then(|written| temp_file.flush().map(|_| written));
    drop(temp_file);

    let written = match written {
        Ok(written) => written,
        Err(e) => {
            error!("Failed to write {}: {}", temp_path.display(), e);
            let _ = fs::remove_file(&temp_path);
            return Err(StorageError::Io(e));
        }
    };

    if let Err(e) = fs::rename(&temp_path, &final_path) {
        error!(
            "Failed to move upload into place at {}: {}",
            final_path.display(),
            e
        );
        let _ = fs::remove_file(&temp_path);
        return Err(StorageError::Io(e));
    }

    info!("Wrote {} ({} bytes)", final_path.display(), written);
    Ok(written)
}

/// Opens an existing regular file for streaming read, returning the
/// handle and its size.
pub fn open_file(path: &Path) -> Result<(File, u64), StorageError> {
    let metadata = match path.metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(StorageError::Io(e)),
    };

    if !metadata.is_file() {
        return Err(StorageError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    Ok((file, metadata.len()))
}

/// `renameat2` with `RENAME_NOREPLACE`: fails with `EEXIST` if the
/// destination exists, atomically. Filesystems without the flag
/// (EINVAL/ENOSYS) fall back to probe-then-rename.
#[cfg(target_os = "linux")]
fn rename_noreplace(old: &Path, new: &Path) -> io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let old_c = CString::new(old.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))?;
    let new_c = CString::new(new.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))?;

    let result = unsafe {
        libc::renameat2(
            libc::AT_FDCWD,
            old_c.as_ptr(),
            libc::AT_FDCWD,
            new_c.as_ptr(),
            libc::RENAME_NOREPLACE,
        )
    };

    if result == 0 {
        return Ok(());
    }

    let error = io::Error::last_os_error();
    match error.raw_os_error() {
        Some(libc::EINVAL) | Some(libc::ENOSYS) => probe_then_rename(old, new),
        _ => Err(error),
    }
}

#[cfg(not(target_os = "linux"))]
fn rename_noreplace(old: &Path, new: &Path) -> io::Result<()> {
    probe_then_rename(old, new)
}

/// Best-effort fallback where no non-replacing rename primitive is
/// available: probe the destination, then rename.
fn probe_then_rename(old: &Path, new: &Path) -> io::Result<()> {
    if new.symlink_metadata().is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination exists",
        ));
    }
    fs::rename(old, new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn listing_a_missing_directory_is_empty_not_an_error() {
        let dir = TempDir::new().unwrap();
        let entries = list_directory(&dir.path().join("nope")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn listing_reports_names_and_kinds() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();

        let mut entries = list_directory(dir.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            entries,
            vec![
                DirEntry { name: "a.txt".into(), kind: EntryKind::File },
                DirEntry { name: "docs".into(), kind: EntryKind::Folder },
            ]
        );
    }

    #[test]
    fn create_directory_is_idempotent_and_recursive() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b/c");
        create_directory(&target).unwrap();
        create_directory(&target).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn remove_entry_is_recursive_and_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir_all(tree.join("sub")).unwrap();
        fs::write(tree.join("sub/f.txt"), b"x").unwrap();

        remove_entry(&tree).unwrap();
        assert!(!tree.exists());
        remove_entry(&tree).unwrap();
    }

    #[test]
    fn rename_moves_the_entry() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("docs");
        let new = dir.path().join("reports");
        fs::create_dir(&old).unwrap();

        rename_entry(&old, &new).unwrap();
        assert!(!old.exists());
        assert!(new.is_dir());
    }

    #[test]
    fn rename_of_a_missing_source_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = rename_entry(&dir.path().join("ghost"), &dir.path().join("x"));
        assert!(matches!(err, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn rename_never_replaces_an_existing_destination() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("a.txt");
        let new = dir.path().join("b.txt");
        fs::write(&old, b"source").unwrap();
        fs::write(&new, b"destination").unwrap();

        let err = rename_entry(&old, &new);
        assert!(matches!(err, Err(StorageError::AlreadyExists(_))));
        // All-or-nothing: both endpoints untouched.
        assert_eq!(fs::read(&old).unwrap(), b"source");
        assert_eq!(fs::read(&new).unwrap(), b"destination");
    }

    #[test]
    fn rename_never_replaces_an_existing_directory() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("one");
        let new = dir.path().join("two");
        fs::create_dir(&old).unwrap();
        fs::create_dir(&new).unwrap();

        assert!(matches!(
            rename_entry(&old, &new),
            Err(StorageError::AlreadyExists(_))
        ));
        assert!(old.is_dir());
    }

    #[test]
    fn write_then_open_round_trips_and_creates_the_directory() {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");

        let written = write_file(&docs, "a.txt", &mut &b"hello"[..]).unwrap();
        assert_eq!(written, 5);

        let (mut file, size) = open_file(&docs.join("a.txt")).unwrap();
        assert_eq!(size, 5);
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn write_overwrites_atomically_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.txt", &mut &b"first"[..]).unwrap();
        write_file(dir.path(), "a.txt", &mut &b"second"[..]).unwrap();

        assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"second");
        let leftovers = list_directory(dir.path()).unwrap();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn open_file_reports_missing_and_non_file_targets() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();

        assert!(matches!(
            open_file(&dir.path().join("ghost.txt")),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            open_file(&dir.path().join("docs")),
            Err(StorageError::NotFound(_))
        ));
    }
}
