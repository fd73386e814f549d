//! Error handling
//!
//! Defines error types and handling for the file service.

pub mod types;

pub use types::*;
