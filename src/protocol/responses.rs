//! Response handling
//!
//! Defines wire response codes and formatting.

pub const OPENING_DATA: u16 = 150;
pub const OK: u16 = 200;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const LOGIN_SUCCESS: u16 = 230;
pub const ACTION_OK: u16 = 250;
pub const PATHNAME_CREATED: u16 = 257;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const RENAME_PENDING: u16 = 350;
pub const TOO_MANY_CONNECTIONS: u16 = 421;
pub const LOCAL_ERROR: u16 = 451;
pub const COMMAND_ERROR: u16 = 500;
pub const SYNTAX_ERROR: u16 = 501;
pub const BAD_SEQUENCE: u16 = 503;
pub const AUTH_FAILED: u16 = 530;
pub const ACTION_FAILED: u16 = 550;
pub const FILE_TOO_LARGE: u16 = 552;
pub const NAME_NOT_ALLOWED: u16 = 553;

/// Format a response line.
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}
