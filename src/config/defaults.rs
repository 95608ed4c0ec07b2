//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "authzd".to_string()
}

// =============================================================================
// Database Defaults
// =============================================================================

pub fn default_db_path() -> String {
    "authzd.redb".to_string()
}

// =============================================================================
// Authentication Defaults
// =============================================================================

pub fn default_shared_secret() -> String {
    let secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    tracing::warn!(
        "No authn.shared_secret configured - using ephemeral random secret. Credentials issued by the authentication service will NOT verify. Set [authn].shared_secret in the config file for production use."
    );
    secret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_is_long_and_random() {
        let a = default_shared_secret();
        let b = default_shared_secret();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn default_db_path_is_redb_file() {
        assert!(default_db_path().ends_with(".redb"));
    }
}
