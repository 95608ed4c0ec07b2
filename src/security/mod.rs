//! Security module for authzd.
//!
//! - **Credentials**: pluggable verification of authentication-service credentials
//! - **Server key**: lifecycle of the capability signing key (ephemeral or file-backed)

pub mod credentials;
pub mod server_key;

pub use credentials::{CredentialVerifier, SharedKeyAuthority};
pub use server_key::{KeyError, load_or_generate};
