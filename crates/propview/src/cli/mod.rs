//! Terminal front end for the dashboard pipeline

pub mod commands;
pub mod display;
