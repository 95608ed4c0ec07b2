//! # authz-proto
//!
//! Core types for container authorization: identifiers, operation masks,
//! ACL set algebra and the MAC-signed capability codec.
//!
//! This crate performs no I/O. Persistence, credential verification and the
//! decision procedure live in the `authzd` service crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use authz_proto::{
//!     generate_cap, verify_cap, CapabilityData, ContainerId, Credential, OperationMask,
//!     ServerKey, UserId,
//! };
//!
//! let key = ServerKey::generate();
//! let credential = Credential::new(UserId::new_v4(), [0u8; 32]);
//! let data = CapabilityData {
//!     container_id: ContainerId::new(7),
//!     operation_mask: OperationMask::READ | OperationMask::WRITE,
//!     credential,
//! };
//!
//! let cap = generate_cap(&key, data);
//! assert!(verify_cap(&key, &cap).is_ok());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod acl;
pub mod capability;
pub mod credential;
pub mod error;
pub mod ids;
pub mod ops;

pub use self::acl::{contains, dedupe_sort, difference, union, Acl};
pub use self::capability::{
    generate_cap, generate_key, verify_cap, Capability, CapabilityData, Mac, ServerKey, MAC_LEN,
};
pub use self::credential::Credential;
pub use self::error::{AclError, CredentialError, MaskError, VerifyCapError};
pub use self::ids::{ContainerId, UserId};
pub use self::ops::{ContainerOp, OperationMask, NUM_CONTAINER_OPS};
