//! Authentication capability
//!
//! Validates credentials and hands back the opaque user identity that
//! names a namespace. The in-memory implementation backs the server
//! binary with the user table from configuration.

use std::collections::HashMap;

use crate::error::AuthError;

const MAX_CREDENTIAL_LENGTH: usize = 128;

/// Capability interface supplied by the hosting process.
pub trait Authenticator {
    /// Validates the credential pair and returns the user identity to
    /// operate as.
    fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError>;
}

/// Credential table held in memory, loaded from configuration.
pub struct InMemoryAuthenticator {
    users: HashMap<String, String>,
}

impl InMemoryAuthenticator {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }
}

impl Authenticator for InMemoryAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if !is_valid_input(username) {
            return Err(AuthError::MalformedInput("invalid username format".into()));
        }
        if !is_valid_input(password) {
            return Err(AuthError::MalformedInput("invalid password format".into()));
        }

        // Unknown user and wrong password are indistinguishable to the
        // caller.
        match self.users.get(username) {
            Some(stored) if stored == password => Ok(username.to_string()),
            _ => Err(AuthError::InvalidCredentials(username.to_string())),
        }
    }
}

/// Basic input sanitation against malformed or malicious credentials.
fn is_valid_input(input: &str) -> bool {
    !input.trim().is_empty()
        && input.len() <= MAX_CREDENTIAL_LENGTH
        && !input.contains(['\r', '\n', '\0'])
}
