//! HTTP handlers for all REST endpoints

pub mod cache;
pub mod dashboard;
pub mod status;
