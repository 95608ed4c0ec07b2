//! Security configuration for capability signing and credential checks.

use serde::Deserialize;

use super::defaults::{default_shared_secret, default_true};

/// Capability issuing and checking.
#[derive(Debug, Clone, Deserialize)]
pub struct CapabilityConfig {
    /// Check live ACL membership when authorizing capabilities (default: true).
    /// When false, a capability with a valid MAC and credential is sufficient.
    #[serde(default = "default_true")]
    pub verify_caps: bool,
    /// File holding the capability signing key. When unset, a fresh key is
    /// generated at every start and all previously issued capabilities stop
    /// verifying after a restart.
    #[serde(default)]
    pub key_file: Option<String>,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            verify_caps: true,
            key_file: None,
        }
    }
}

/// Credential verification against the authentication service.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthnConfig {
    /// Secret shared with the authentication service for credential MACs.
    /// MUST be kept private and should be at least 32 characters.
    #[serde(default = "default_shared_secret")]
    pub shared_secret: String,
    /// User ids whose credentials are refused even when their MAC is valid.
    #[serde(default)]
    pub revoked_users: Vec<String>,
}

impl Default for AuthnConfig {
    fn default() -> Self {
        Self {
            shared_secret: default_shared_secret(),
            revoked_users: Vec::new(),
        }
    }
}
