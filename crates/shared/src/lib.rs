//! Shared errors, configuration, and auth types for ParkDesk.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management (server, database, JWT, till display settings)
//! - JWT claims and token validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;

#[cfg(test)]
mod config_tests;

pub use auth::Claims;
pub use config::{AppConfig, DatabaseConfig, JwtSettings, ServerConfig, TillConfig};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
