//! Integration test common infrastructure.
//!
//! Provides a fully wired authorization service over an in-process store
//! and helpers for minting users and capabilities.

pub mod service;

#[allow(unused_imports)]
pub use service::TestService;
