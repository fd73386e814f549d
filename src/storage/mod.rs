//! File system storage management
//!
//! CRUD primitives over confined absolute paths. Nothing in this module
//! performs containment checks; callers must resolve every path through
//! the namespace module first.

pub mod operations;
pub mod results;

pub use operations::{
    create_directory, list_directory, open_file, remove_entry, rename_entry, write_file,
};
pub use results::{DirEntry, EntryKind};
