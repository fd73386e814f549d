//! Wire protocol implementation
//!
//! Handles command parsing, dispatch to the file operations, and
//! response generation.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{Command, CommandResult, CommandStatus, parse_command};
pub use handlers::{handle_auth_command, handle_command, handle_stor};
