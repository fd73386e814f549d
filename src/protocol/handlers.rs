//! Command handlers
//!
//! Translates parsed commands for an authenticated session into
//! namespace resolutions plus storage calls, and maps results and errors
//! back to protocol responses. Containment and argument errors are never
//! reported with the underlying storage path.

use log::{error, info, warn};
use std::io::Read;

use crate::auth::Authenticator;
use crate::error::{ContainmentError, OpError, StorageError};
use crate::namespace::{Namespace, validate_entry_name};
use crate::protocol::commands::{Command, CommandResult, CommandStatus};
use crate::protocol::responses::{self as resp, format_response};
use crate::session::Session;
use crate::storage;

/// Dispatches a command for a connected session.
pub fn handle_command(
    session: &mut Session,
    command: &Command,
    namespace: &Namespace,
    authenticator: &dyn Authenticator,
) -> CommandResult {
    match command {
        Command::QUIT => handle_cmd_quit(session),
        Command::LOGOUT => handle_cmd_logout(session),
        Command::USER(username) => handle_cmd_user(session, username),
        Command::PASS(password) => handle_cmd_pass(session, password, authenticator),
        Command::LIST(path) => handle_cmd_list(session, path, namespace),
        Command::MKD(path) => handle_cmd_mkd(session, path, namespace),
        Command::DEL(path) => handle_cmd_del(session, path, namespace),
        Command::RNFR(path) => handle_cmd_rnfr(session, path, namespace),
        Command::RNTO(path) => handle_cmd_rnto(session, path, namespace),
        Command::RETR(path) => handle_cmd_retr(session, path, namespace),
        // Upload bodies are framed by the session layer, which calls
        // `handle_stor` directly; this arm is unreachable from it.
        Command::STOR { .. } => failure(resp::LOCAL_ERROR, "Upload body missing"),
        Command::UNKNOWN => failure(resp::COMMAND_ERROR, "Command not recognized"),
    }
}

/// Restricted dispatcher for connections that have not authenticated
/// yet.
pub fn handle_auth_command(
    session: &mut Session,
    command: &Command,
    authenticator: &dyn Authenticator,
) -> CommandResult {
    match command {
        Command::USER(username) => handle_cmd_user(session, username),
        Command::PASS(password) => handle_cmd_pass(session, password, authenticator),
        Command::QUIT => handle_cmd_quit(session),
        _ => failure(resp::AUTH_FAILED, "Please login with USER and PASS"),
    }
}

/// Handles an upload whose body the session layer already read off the
/// wire. The final path component is validated as a single entry name;
/// the directory part goes through the namespace resolver like every
/// other path argument.
pub fn handle_stor(
    session: &mut Session,
    path: &str,
    body: &[u8],
    namespace: &Namespace,
) -> CommandResult {
    let user_id = match authenticated_user(session) {
        Ok(user_id) => user_id,
        Err(result) => return result,
    };

    let (dir_rel, name) = match path.rsplit_once(['/', '\\']) {
        Some((dir, name)) => (dir, name),
        None => ("", path),
    };
    if name.is_empty() {
        return op_failure(
            OpError::InvalidArgument("a filename is required".into()),
            path,
        );
    }
    if let Err(e) = validate_entry_name(name) {
        return op_failure(e.into(), path);
    }

    let resolved = match namespace.resolve(&user_id, dir_rel) {
        Ok(resolved) => resolved,
        Err(e) => return op_failure(e, path),
    };

    match storage::write_file(&resolved.real, name, &mut &body[..]) {
        Ok(written) => {
            info!(
                "Client {} stored {} ({} bytes)",
                user_id,
                virtual_display(path),
                written
            );
            success(
                resp::TRANSFER_COMPLETE,
                &format!("Transfer complete ({} bytes)", written),
            )
        }
        Err(e) => op_failure(e.into(), path),
    }
}

fn handle_cmd_quit(session: &mut Session) -> CommandResult {
    session.logout();
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(resp::GOODBYE, "Goodbye")),
        data: None,
    }
}

fn handle_cmd_logout(session: &mut Session) -> CommandResult {
    session.logout();
    success(resp::OK, "Logged out")
}

/// USER records the name under negotiation; the credential check
/// happens at PASS.
fn handle_cmd_user(session: &mut Session, username: &str) -> CommandResult {
    session.set_user_id(None);
    session.set_username(Some(username.to_string()));
    success(resp::PASSWORD_REQUIRED, "Password required")
}

fn handle_cmd_pass(
    session: &mut Session,
    password: &str,
    authenticator: &dyn Authenticator,
) -> CommandResult {
    let Some(username) = session.username().cloned() else {
        return failure(resp::AUTH_FAILED, "Please enter the username first");
    };

    match authenticator.authenticate(&username, password) {
        Ok(user_id) => {
            session.set_user_id(Some(user_id));
            success(resp::LOGIN_SUCCESS, "Login successful")
        }
        Err(e) => {
            warn!("Login failed for {}: {}", username, e);
            session.set_user_id(None);
            failure(resp::AUTH_FAILED, "Login incorrect")
        }
    }
}

fn handle_cmd_list(session: &mut Session, path: &str, namespace: &Namespace) -> CommandResult {
    let user_id = match authenticated_user(session) {
        Ok(user_id) => user_id,
        Err(result) => return result,
    };

    let resolved = match namespace.resolve(&user_id, path) {
        Ok(resolved) => resolved,
        Err(e) => return op_failure(e, path),
    };

    match storage::list_directory(&resolved.real) {
        Ok(entries) => {
            let mut listing = String::new();
            for entry in &entries {
                listing.push_str(&entry.name);
                if entry.is_folder() {
                    listing.push('/');
                }
                listing.push_str("\r\n");
            }
            info!(
                "Client {} listed {} (real: {}) - {} entries",
                user_id,
                virtual_display(path),
                resolved.real.display(),
                entries.len()
            );
            CommandResult {
                status: CommandStatus::Success,
                message: Some(format_response(
                    resp::OPENING_DATA,
                    &format!(
                        "Opening listing of \"{}\" ({} entries)",
                        virtual_display(path),
                        entries.len()
                    ),
                )),
                data: Some(listing.into_bytes()),
            }
        }
        Err(e) => op_failure(e.into(), path),
    }
}

fn handle_cmd_mkd(session: &mut Session, path: &str, namespace: &Namespace) -> CommandResult {
    let user_id = match authenticated_user(session) {
        Ok(user_id) => user_id,
        Err(result) => return result,
    };

    let resolved = match namespace.resolve(&user_id, path) {
        Ok(resolved) => resolved,
        Err(e) => return op_failure(e, path),
    };

    match storage::create_directory(&resolved.real) {
        Ok(()) => success(
            resp::PATHNAME_CREATED,
            &format!("\"{}\" created", virtual_display(path)),
        ),
        Err(e) => op_failure(e.into(), path),
    }
}

fn handle_cmd_del(session: &mut Session, path: &str, namespace: &Namespace) -> CommandResult {
    let user_id = match authenticated_user(session) {
        Ok(user_id) => user_id,
        Err(result) => return result,
    };

    let resolved = match namespace.resolve(&user_id, path) {
        Ok(resolved) => resolved,
        Err(e) => return op_failure(e, path),
    };
    if resolved.is_root() {
        return op_failure(
            OpError::InvalidArgument("cannot remove the namespace root".into()),
            path,
        );
    }

    match storage::remove_entry(&resolved.real) {
        Ok(()) => success(resp::ACTION_OK, "Delete successful"),
        Err(e) => op_failure(e.into(), path),
    }
}

/// RNFR checks the source and parks it on the session; the rename
/// itself resolves both endpoints again at RNTO time, adjacent to the
/// actual filesystem operation.
fn handle_cmd_rnfr(session: &mut Session, path: &str, namespace: &Namespace) -> CommandResult {
    let user_id = match authenticated_user(session) {
        Ok(user_id) => user_id,
        Err(result) => return result,
    };

    let resolved = match namespace.resolve(&user_id, path) {
        Ok(resolved) => resolved,
        Err(e) => return op_failure(e, path),
    };
    if resolved.is_root() {
        return op_failure(
            OpError::InvalidArgument("cannot rename the namespace root".into()),
            path,
        );
    }
    if resolved.real.symlink_metadata().is_err() {
        return op_failure(StorageError::NotFound(resolved.real.clone()).into(), path);
    }

    session.set_pending_rename(Some(path.to_string()));
    success(resp::RENAME_PENDING, "Ready for RNTO")
}

fn handle_cmd_rnto(session: &mut Session, path: &str, namespace: &Namespace) -> CommandResult {
    let user_id = match authenticated_user(session) {
        Ok(user_id) => user_id,
        Err(result) => return result,
    };

    let Some(from_rel) = session.take_pending_rename() else {
        return failure(resp::BAD_SEQUENCE, "RNFR required first");
    };

    let from = match namespace.resolve(&user_id, &from_rel) {
        Ok(resolved) => resolved,
        Err(e) => return op_failure(e, &from_rel),
    };
    let to = match namespace.resolve(&user_id, path) {
        Ok(resolved) => resolved,
        Err(e) => return op_failure(e, path),
    };
    if to.is_root() {
        return op_failure(
            OpError::InvalidArgument("a target name is required".into()),
            path,
        );
    }

    match storage::rename_entry(&from.real, &to.real) {
        Ok(()) => {
            info!(
                "Client {} renamed {} -> {}",
                user_id,
                virtual_display(&from_rel),
                virtual_display(path)
            );
            success(resp::ACTION_OK, "Rename successful")
        }
        Err(e @ StorageError::NotFound(_)) => op_failure(e.into(), &from_rel),
        Err(e) => op_failure(e.into(), path),
    }
}

fn handle_cmd_retr(session: &mut Session, path: &str, namespace: &Namespace) -> CommandResult {
    let user_id = match authenticated_user(session) {
        Ok(user_id) => user_id,
        Err(result) => return result,
    };

    let resolved = match namespace.resolve(&user_id, path) {
        Ok(resolved) => resolved,
        Err(e) => return op_failure(e, path),
    };

    let (mut file, size) = match storage::open_file(&resolved.real) {
        Ok(open) => open,
        Err(e) => return op_failure(e.into(), path),
    };

    let mut content = Vec::with_capacity(size as usize);
    if let Err(e) = file.read_to_end(&mut content) {
        error!("Failed to read {}: {}", resolved.real.display(), e);
        return op_failure(StorageError::Io(e).into(), path);
    }

    info!(
        "Client {} retrieved {} ({} bytes)",
        user_id,
        virtual_display(path),
        content.len()
    );
    CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(
            resp::OPENING_DATA,
            &format!(
                "Opening download of \"{}\" ({} bytes)",
                virtual_display(path),
                content.len()
            ),
        )),
        data: Some(content),
    }
}

/// Extracts the authenticated user identity or produces the standard
/// not-logged-in refusal.
fn authenticated_user(session: &Session) -> Result<String, CommandResult> {
    match session.user_id() {
        Some(user_id) => Ok(user_id.clone()),
        None => Err(failure(resp::AUTH_FAILED, "Not logged in")),
    }
}

/// Maps an operation error to its wire response. Client-caused errors
/// (containment, bad arguments) never echo the storage location; the
/// not-found and already-exists messages name only the virtual path the
/// caller supplied.
fn op_failure(error: OpError, virtual_path: &str) -> CommandResult {
    match error {
        OpError::Containment(e) => {
            warn!("Containment violation: {}", e);
            match e {
                ContainmentError::InvalidSegment(_) => {
                    failure(resp::NAME_NOT_ALLOWED, "Name not allowed")
                }
                _ => failure(resp::ACTION_FAILED, "Access denied"),
            }
        }
        OpError::InvalidArgument(message) => failure(resp::SYNTAX_ERROR, &message),
        OpError::Storage(StorageError::NotFound(real)) => {
            info!("Not found: {}", real.display());
            failure(
                resp::ACTION_FAILED,
                &format!("Not found: {}", virtual_display(virtual_path)),
            )
        }
        OpError::Storage(StorageError::AlreadyExists(real)) => {
            info!("Already exists: {}", real.display());
            failure(
                resp::NAME_NOT_ALLOWED,
                &format!("Already exists: {}", virtual_display(virtual_path)),
            )
        }
        OpError::Storage(StorageError::Io(e)) => {
            error!("Storage failure: {}", e);
            failure(resp::LOCAL_ERROR, "Local error in processing")
        }
    }
}

/// Display form of a relative path: the namespace root shows as `/`.
fn virtual_display(path: &str) -> &str {
    if path.trim().is_empty() { "/" } else { path }
}

fn success(code: u16, message: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(format_response(code, message)),
        data: None,
    }
}

fn failure(code: u16, message: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure(message.to_string()),
        message: Some(format_response(code, message)),
        data: None,
    }
}
