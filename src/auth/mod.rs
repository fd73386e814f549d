//! Authentication system
//!
//! The file service never embeds credentials: authentication sits behind
//! the `Authenticator` capability, and the core only ever sees the user
//! identity a successful login produced.

pub mod authenticator;

pub use authenticator::{Authenticator, InMemoryAuthenticator};
