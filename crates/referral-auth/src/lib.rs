//! # referral-auth
//!
//! The bundled local identity provider: JWT issuance/verification and role
//! lookup, backed by the `users` table `referral-store` persists.
//!
//! This crate defines the two capability traits the HTTP surface depends on
//! — [`TokenVerifier`] and [`RoleLookup`] — and [`LocalIdentityProvider`],
//! the only implementation this workspace ships. A deployment that wants a
//! different identity backend (an external IdP, SSO) can swap the
//! implementation passed to the server without touching route handlers.

#![deny(unsafe_code)]

pub mod errors;
pub mod jwt;
pub mod local;
pub mod password;
pub mod types;

pub use errors::AuthError;
pub use local::{LocalIdentityProvider, LoginResult};
pub use types::{Principal, Role, RoleLookup, TokenVerifier};
