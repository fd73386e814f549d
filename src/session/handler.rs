//! Session connection loop
//!
//! Reads command lines from an authenticated connection, frames upload
//! bodies, dispatches to the command handlers, and writes responses and
//! data payloads back.

use log::{debug, error, info};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::namespace::Namespace;
use crate::protocol::responses::{self as resp, format_response};
use crate::protocol::{Command, CommandStatus, handle_command, handle_stor, parse_command};
use crate::session::Session;

/// Drives one authenticated connection until it quits or drops.
pub async fn handle_session(
    cmd_stream: TcpStream,
    sessions: Arc<Mutex<HashMap<SocketAddr, Session>>>,
    client_addr: SocketAddr,
    namespace: Arc<Namespace>,
    authenticator: Arc<dyn Authenticator + Send + Sync>,
    config: Arc<ServerConfig>,
) {
    let (read_half, mut write_half) = cmd_stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Ok(_) => {
                if line.len() > config.max_command_length {
                    let _ = write_half
                        .write_all(format_response(resp::COMMAND_ERROR, "Command too long").as_bytes())
                        .await;
                    continue;
                }

                let trimmed = line.trim_end_matches("\r\n");
                let command = parse_command(trimmed);
                debug!("Received from {}: {:?}", client_addr, command);

                // Upload bodies follow the STOR line on the same stream;
                // read the declared byte count before dispatching.
                let body = match &command {
                    Command::STOR { size, .. } => {
                        if *size > config.max_file_size_bytes() {
                            // The client will still stream the refused
                            // body, which would desynchronize the command
                            // stream; drop the connection instead.
                            let _ = write_half
                                .write_all(
                                    format_response(resp::FILE_TOO_LARGE, "File too large")
                                        .as_bytes(),
                                )
                                .await;
                            break;
                        }
                        let mut body = vec![0u8; *size as usize];
                        match reader.read_exact(&mut body).await {
                            Ok(_) => Some(body),
                            Err(e) => {
                                error!("Upload body read failed from {}: {}", client_addr, e);
                                break;
                            }
                        }
                    }
                    _ => None,
                };

                let mut sessions_guard = sessions.lock().await;
                let Some(session) = sessions_guard.get_mut(&client_addr) else {
                    error!("Client {} not found in session map", client_addr);
                    let _ = write_half
                        .write_all(
                            format_response(resp::TOO_MANY_CONNECTIONS, "Session not found")
                                .as_bytes(),
                        )
                        .await;
                    break;
                };

                let result = match (&command, body) {
                    (Command::STOR { path, .. }, Some(body)) => {
                        handle_stor(session, path, &body, &namespace)
                    }
                    _ => handle_command(session, &command, &namespace, authenticator.as_ref()),
                };
                drop(sessions_guard);

                if let Some(msg) = result.message {
                    let _ = write_half.write_all(msg.as_bytes()).await;
                }
                if let Some(data) = result.data {
                    let _ = write_half.write_all(&data).await;
                    let _ = write_half
                        .write_all(
                            format_response(resp::TRANSFER_COMPLETE, "Transfer complete")
                                .as_bytes(),
                        )
                        .await;
                }

                if let CommandStatus::CloseConnection = result.status {
                    info!("Client {} requested to quit", client_addr);
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }

    sessions.lock().await.remove(&client_addr);
    info!("Client {} disconnected", client_addr);
}
