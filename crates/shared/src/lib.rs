//! Shared types, errors, and configuration for Scriva.
//!
//! This crate provides common types used across all other crates:
//! - Credit balance types (two-tier, integer amounts)
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT validation for the API boundary

pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
