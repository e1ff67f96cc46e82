//! offgrid-agent entry point.
//!
//! Boots the caching agent and serves it as an MCP server on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use offgrid_client::{Agent, FetchConfig, HttpNetwork};
use offgrid_core::{AppConfig, CacheDb};

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let generation = config.generation_id();
    tracing::info!(%generation, scope = %config.scope, db = %config.db_path.display(), "starting offgrid-agent on stdio");

    let cache = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(HttpNetwork::new(FetchConfig::from(&config))?);
    let agent = Arc::new(Agent::new(&config, cache.clone(), network)?);
    if agent.resume().await? {
        tracing::info!(%generation, "serving stored generation from a previous run");
    }

    let handler = handler::OffgridServer::new(agent, cache);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
