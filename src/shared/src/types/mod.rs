//! Shared type definitions for the BoostTrade dashboard
//!
//! Types exchanged between the mock API core and the screens that consume it.

pub mod api;
pub mod core;

pub use core::{LoginCredentials, Role, Session, User};

pub use api::{ApiResponse, ErrorResponse, HealthCheckResponse, HealthStatus};
