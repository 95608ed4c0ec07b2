//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig)
//! - [`database`]: Key/value store selection and startup behavior (DatabaseConfig)
//! - [`security`]: Capability signing and credential verification (CapabilityConfig, AuthnConfig)
//! - [`validation`]: Startup checks that collect every problem at once

mod database;
mod defaults;
mod security;
mod types;
pub mod validation;

pub use database::{DatabaseBackend, DatabaseConfig};
pub use security::{AuthnConfig, CapabilityConfig};
pub use types::{Config, ConfigError, ServerConfig};
