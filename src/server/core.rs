//! Server core
//!
//! Binds the listener, greets and authenticates new connections, and
//! hands authenticated clients off to the session loop.

use log::{error, info, warn};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::auth::{Authenticator, InMemoryAuthenticator};
use crate::config::ServerConfig;
use crate::namespace::Namespace;
use crate::protocol::responses::{self as resp, format_response};
use crate::protocol::{CommandStatus, handle_auth_command, parse_command};
use crate::session::{Session, handle_session};

pub struct Server {
    session_registry: Arc<Mutex<HashMap<SocketAddr, Session>>>,
    namespace: Arc<Namespace>,
    authenticator: Arc<dyn Authenticator + Send + Sync>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Self {
        let socket = config.control_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                panic!("Server startup failed on socket {}: {}", socket, e);
            }
        };

        if let Err(e) = std::fs::create_dir_all(config.storage_root_path()) {
            warn!("Failed to create storage base directory: {}", e);
        } else {
            info!("Storage base directory: {}", config.storage_root);
        }

        if config.users.is_empty() {
            warn!("No users configured; every login will be refused");
        }

        let namespace = Arc::new(Namespace::new(config.storage_root_path()));
        let authenticator: Arc<dyn Authenticator + Send + Sync> =
            Arc::new(InMemoryAuthenticator::new(config.users.clone()));

        Self {
            session_registry: Arc::new(Mutex::new(HashMap::new())),
            namespace,
            authenticator,
            listener,
            config: Arc::new(config),
        }
    }

    pub async fn start(&self) {
        info!(
            "Starting FileBox server on {} (max {} clients)",
            self.config.control_socket(),
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let session_registry = Arc::clone(&self.session_registry);
                    let namespace = Arc::clone(&self.namespace);
                    let authenticator = Arc::clone(&self.authenticator);
                    let config = Arc::clone(&self.config);

                    // Spawn a task per client so the accept loop never blocks.
                    tokio::spawn(async move {
                        if let Err(e) = handle_new_client(
                            stream,
                            addr,
                            session_registry,
                            namespace,
                            authenticator,
                            config,
                        )
                        .await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Greets a new connection, runs the authentication handshake,
/// registers the session, and hands off to the session loop.
async fn handle_new_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    session_registry: Arc<Mutex<HashMap<SocketAddr, Session>>>,
    namespace: Arc<Namespace>,
    authenticator: Arc<dyn Authenticator + Send + Sync>,
    config: Arc<ServerConfig>,
) -> Result<(), std::io::Error> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    reader
        .get_mut()
        .write_all(format_response(resp::READY, "FileBox file service ready").as_bytes())
        .await?;
    reader.get_mut().flush().await?;

    let mut session = Session::default();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionAborted,
                "Client disconnected during authentication",
            ));
        }

        let command = parse_command(line.trim_end_matches("\r\n"));
        let result = handle_auth_command(&mut session, &command, authenticator.as_ref());

        if let Some(msg) = result.message {
            reader.get_mut().write_all(msg.as_bytes()).await?;
        }
        if let CommandStatus::CloseConnection = result.status {
            return Ok(());
        }

        if session.is_logged_in() {
            let mut sessions = session_registry.lock().await;

            if sessions.len() >= config.max_clients {
                reader
                    .get_mut()
                    .write_all(
                        format_response(
                            resp::TOO_MANY_CONNECTIONS,
                            "Too many connections. Try again later.",
                        )
                        .as_bytes(),
                    )
                    .await?;
                return Ok(());
            }

            session.set_client_addr(Some(client_addr));
            sessions.insert(client_addr, session);

            info!(
                "Authenticated client: {} ({}/{} clients)",
                client_addr,
                sessions.len(),
                config.max_clients
            );

            let cmd_stream = reader.into_inner();

            drop(sessions);

            handle_session(
                cmd_stream,
                session_registry,
                client_addr,
                namespace,
                authenticator,
                config,
            )
            .await;

            return Ok(());
        }
    }
}
