//! SGI Server - HTTP API over the institutional stored procedures
//!
//! This binary loads the configuration and serves the route catalog
//! against SQL Server.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
