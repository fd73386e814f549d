//! Storage result types
//!
//! Defines result structures returned by storage operations.

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
}

/// One entry of a directory listing, in filesystem order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}
