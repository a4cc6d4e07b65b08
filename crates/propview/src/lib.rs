//! Propview - Property and Agent Dashboard Backend
//!
//! Fetches the property and agent tables from PostgreSQL, joins them, and
//! serves filterable chart data to a browser front end or the terminal.

pub mod aggregate;
pub mod cache;
pub mod charts;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod filter;
pub mod merge;
pub mod notice;
pub mod server;
pub mod source;
pub mod table;
pub mod value;
