//! Shared types and utilities for the BoostTrade campaign dashboard

pub mod config;
pub mod types;

pub use config::{LoggingConfig, ServerConfig};

pub use types::*;
