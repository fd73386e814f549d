//! FileBox Server - Entry Point
//!
//! A per-user sandboxed file service: every authenticated user gets an
//! isolated directory tree and a small command set that can never reach
//! outside it.

use log::info;

use filebox_server::Server;
use filebox_server::config::ServerConfig;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching FileBox server...");

    let config = ServerConfig::load();
    let server = Server::new(config).await;
    server.start().await;
}
