//! REST API module for the dashboard
//!
//! Serves the dashboard pipeline over HTTP. Uses axum for routing and schemars
//! for response schema generation.

pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod startup;
pub mod types;

use std::sync::Arc;

use crate::config::{Config, ConnectionInfo};
use crate::dashboard::Dashboard;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
  pub dashboard: Arc<Dashboard>,
  pub connection: Arc<ConnectionInfo>,
}

impl AppState {
  pub fn new(dashboard: Dashboard, connection: ConnectionInfo) -> Self {
    Self { dashboard: Arc::new(dashboard), connection: Arc::new(connection) }
  }

  pub fn from_config(config: &Config) -> Self {
    Self::new(Dashboard::from_config(config), config.connection_info())
  }
}
