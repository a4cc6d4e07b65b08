//! Propview REST Server
//!
//! Serves dashboard data for the browser front end: filterable views, filter
//! options, raw tables and cache management.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use propview::config::{self, Config};
use propview::server::startup::start_server;
use propview::server::AppState;

#[derive(Parser)]
#[command(name = "propview_server")]
#[command(about = "Propview REST API Server")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), ", courtesy of Propview"))]
struct Args {
  /// Server bind address
  #[arg(long, env = "PROPVIEW_BIND", default_value = "127.0.0.1:8501")]
  bind: SocketAddr,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let filter = if args.verbose {
    EnvFilter::new("propview=debug,tower_http=debug,sqlx=warn,info")
  } else {
    EnvFilter::new("propview=info,tower_http=info,sqlx=error,warn")
  };
  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  if let Some(path) = config::load_env_files() {
    tracing::info!(path = %path.display(), "loaded environment file");
  }
  let config = Config::from_env()?;

  tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting propview server");
  tracing::info!(
    host = %config.db.host,
    database = %config.db.database,
    property_table = %config.tables.property,
    agent_table = %config.tables.agent,
    "dashboard source"
  );

  start_server(args.bind, AppState::from_config(&config)).await
}
