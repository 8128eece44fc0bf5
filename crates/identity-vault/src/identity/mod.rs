//! Identity model: keypair and group-membership credentials.
//!
//! The identity module provides the [`Identity`] sum type handed to and
//! returned from the vault service.

pub mod model;

pub use model::{GroupIdentity, Identity, IdentityKind, IdentityPath, KeypairIdentity};
