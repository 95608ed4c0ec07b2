//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::{Config, DatabaseBackend};
use authz_proto::UserId;
use std::path::Path;
use thiserror::Error;

/// Minimum length for the credential shared secret.
const MIN_SECRET_LEN: usize = 16;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("database.path is required for the redb backend")]
    MissingDatabasePath,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
    #[error("capability.key_file parent directory does not exist: {0}")]
    KeyFilePathInvalid(String),
    #[error("authn.shared_secret must be at least {MIN_SECRET_LEN} characters")]
    WeakSharedSecret,
    #[error("authn.revoked_users contains an invalid user id: '{0}'")]
    InvalidRevokedUser(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    if config.database.backend == DatabaseBackend::Redb {
        if config.database.path.is_empty() {
            errors.push(ValidationError::MissingDatabasePath);
        } else if !parent_exists(&config.database.path) {
            errors.push(ValidationError::DatabasePathInvalid(config.database.path.clone()));
        }
    }

    if let Some(ref key_file) = config.capability.key_file
        && !parent_exists(key_file)
    {
        errors.push(ValidationError::KeyFilePathInvalid(key_file.clone()));
    }

    if config.authn.shared_secret.len() < MIN_SECRET_LEN {
        errors.push(ValidationError::WeakSharedSecret);
    }

    for user in &config.authn.revoked_users {
        if user.parse::<UserId>().is_err() {
            errors.push(ValidationError::InvalidRevokedUser(user.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn parent_exists(path: &str) -> bool {
    match Path::new(path).parent() {
        Some(parent) => parent.as_os_str().is_empty() || parent.exists(),
        None => true,
    }
}
