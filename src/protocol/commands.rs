//! Command parsing
//!
//! Defines the wire command set and the parsing logic that turns a raw
//! request line into a typed command.

/// A command parsed from a client request line.
///
/// Path arguments are relative to the authenticated user's namespace
/// root; an empty `LIST` path denotes the root itself.
#[derive(Debug, PartialEq)]
pub enum Command {
    USER(String),
    PASS(String),
    /// List a directory; empty path means the namespace root.
    LIST(String),
    /// Create a folder, including missing parents.
    MKD(String),
    /// Recursively delete a file or folder.
    DEL(String),
    /// First half of a rename: the source path.
    RNFR(String),
    /// Second half of a rename: the destination path.
    RNTO(String),
    /// Upload: `size` raw bytes follow the command line.
    STOR { size: u64, path: String },
    /// Download a file.
    RETR(String),
    LOGOUT,
    QUIT,
    UNKNOWN,
}

/// Outcome status of executing a command.
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Full result of a command execution. `data` carries an in-band
/// payload (listing text or file content) written after the message.
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
    pub data: Option<Vec<u8>>,
}

/// Parses a raw request line into the `Command` enum.
///
/// Validates required arguments and returns `UNKNOWN` if a known
/// command is misused.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "QUIT" | "Q" => Command::QUIT,
        "LOGOUT" => Command::LOGOUT,
        "LIST" => Command::LIST(arg.to_string()),
        "USER" if !arg.is_empty() => Command::USER(arg.to_string()),
        "PASS" if !arg.is_empty() => Command::PASS(arg.to_string()),
        "MKD" if !arg.is_empty() => Command::MKD(arg.to_string()),
        "DEL" if !arg.is_empty() => Command::DEL(arg.to_string()),
        "RNFR" if !arg.is_empty() => Command::RNFR(arg.to_string()),
        "RNTO" if !arg.is_empty() => Command::RNTO(arg.to_string()),
        "RETR" if !arg.is_empty() => Command::RETR(arg.to_string()),
        "STOR" if !arg.is_empty() => parse_stor(arg),
        _ => Command::UNKNOWN,
    }
}

/// `STOR <size> <path>`: the size prefix frames the body bytes that
/// follow the command line.
fn parse_stor(arg: &str) -> Command {
    let mut parts = arg.splitn(2, char::is_whitespace);
    let size = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("").trim();

    match size.parse::<u64>() {
        Ok(size) if !path.is_empty() => Command::STOR {
            size,
            path: path.to_string(),
        },
        _ => Command::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!(parse_command("quit"), Command::QUIT);
        assert_eq!(parse_command("User alice"), Command::USER("alice".into()));
        assert_eq!(parse_command("LIST docs"), Command::LIST("docs".into()));
    }

    #[test]
    fn list_without_argument_means_the_namespace_root() {
        assert_eq!(parse_command("LIST"), Command::LIST(String::new()));
    }

    #[test]
    fn path_arguments_may_contain_spaces() {
        assert_eq!(
            parse_command("MKD my documents/reports"),
            Command::MKD("my documents/reports".into())
        );
        assert_eq!(
            parse_command("STOR 12 docs/a b.txt"),
            Command::STOR { size: 12, path: "docs/a b.txt".into() }
        );
    }

    #[test]
    fn commands_missing_required_arguments_are_unknown() {
        assert_eq!(parse_command("USER"), Command::UNKNOWN);
        assert_eq!(parse_command("MKD   "), Command::UNKNOWN);
        assert_eq!(parse_command("STOR 12"), Command::UNKNOWN);
        assert_eq!(parse_command("STOR twelve a.txt"), Command::UNKNOWN);
        assert_eq!(parse_command("NOSUCH"), Command::UNKNOWN);
    }
}
