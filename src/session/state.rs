//! Session state
//!
//! Defines the `Session` struct and associated methods to track a
//! connection's authentication progress and the in-flight half of a
//! two-step rename.

use std::net::SocketAddr;

/// State of one connected client.
#[derive(Default)]
pub struct Session {
    username: Option<String>,
    user_id: Option<String>,
    client_addr: Option<SocketAddr>,
    pending_rename: Option<String>,
}

impl Session {
    /// Resets the session to its unauthenticated state.
    pub fn logout(&mut self) {
        self.username = None;
        self.user_id = None;
        self.pending_rename = None;
    }

    /// Whether a PASS has been accepted for this connection.
    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }

    /// Username most recently offered via USER.
    pub fn username(&self) -> Option<&String> {
        self.username.as_ref()
    }

    /// Authenticated user identity, once login succeeded.
    pub fn user_id(&self) -> Option<&String> {
        self.user_id.as_ref()
    }

    pub fn client_addr(&self) -> Option<&SocketAddr> {
        self.client_addr.as_ref()
    }

    pub fn set_username(&mut self, username: Option<String>) {
        self.username = username;
    }

    pub fn set_user_id(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    pub fn set_client_addr(&mut self, addr: Option<SocketAddr>) {
        self.client_addr = addr;
    }

    /// Parks the source path of a rename until the matching RNTO.
    pub fn set_pending_rename(&mut self, path: Option<String>) {
        self.pending_rename = path;
    }

    /// Takes the parked rename source, clearing it.
    pub fn take_pending_rename(&mut self) -> Option<String> {
        self.pending_rename.take()
    }
}
