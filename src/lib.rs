//! authzd - container authorization service.
//!
//! Issues MAC-signed capabilities for operations on storage containers and
//! checks them, optionally against live per-operation ACLs, before a
//! consuming service performs the operation. The pure core (ids, masks, ACL
//! algebra, capability codec) lives in `authz-proto`.

pub mod config;
pub mod db;
pub mod decision;
pub mod error;
pub mod http;
pub mod metrics;
pub mod registry;
pub mod security;
pub mod service;
pub mod state;
pub mod store;
pub mod telemetry;

pub use crate::error::{AuthzError, AuthzResult};
pub use crate::registry::ProcessId;
pub use crate::service::AuthorizationService;
pub use crate::state::{AuthorizationState, RevocationNotice, StateParams};
