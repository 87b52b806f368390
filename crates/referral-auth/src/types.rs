//! Role and principal types, and the capability traits the HTTP surface
//! depends on rather than on the concrete identity provider.

use serde::{Deserialize, Serialize};

use crate::errors::AuthError;

/// A local account's permission level. `Admin` may submit uploads; `Viewer`
/// may only read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

impl Role {
    /// The wire/storage representation (`"admin"` / `"viewer"`).
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }

    /// Parse a role back from its wire representation.
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

/// The authenticated caller attached to a request once its bearer token
/// verifies and its role resolves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: String,
    pub role: Role,
}

/// Verifies a bearer token and recovers the subject id it was issued for.
/// Does not resolve a role on its own — see [`RoleLookup`].
pub trait TokenVerifier: Send + Sync {
    /// Verify `token`'s signature and expiry, returning the subject id it
    /// carries.
    fn verify(&self, token: &str) -> Result<String, AuthError>;
}

/// Resolves a verified subject id to its current role. Kept separate from
/// [`TokenVerifier`] so a token's validity and an account's current
/// permissions can be checked (and revoked) independently.
pub trait RoleLookup: Send + Sync {
    /// Resolve `subject_id` to its current role, or an error if the account
    /// no longer exists.
    fn role_for(&self, subject_id: &str) -> Result<Role, AuthError>;
}
