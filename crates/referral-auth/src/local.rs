//! The bundled local identity provider: account storage via
//! [`referral_store::StoreAdapter`], JWT issuance/verification via
//! [`crate::jwt::JwtCodec`].

use referral_store::StoreAdapter;
use referral_store::sqlite::repositories::user::UserRecord;

use crate::errors::AuthError;
use crate::jwt::JwtCodec;
use crate::password::{hash_password, verify_password};
use crate::types::{Principal, Role, RoleLookup, TokenVerifier};

/// The outcome of a successful login: a bearer token and the principal it
/// was issued for.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub principal: Principal,
}

/// Local identity provider, backed by the `users` table. Implements both
/// [`TokenVerifier`] and [`RoleLookup`], the two capabilities the HTTP
/// surface's auth gate depends on.
#[derive(Clone)]
pub struct LocalIdentityProvider {
    store: StoreAdapter,
    jwt: JwtCodec,
}

impl LocalIdentityProvider {
    #[must_use]
    pub fn new(store: StoreAdapter, jwt_secret: &str) -> Self {
        Self { store, jwt: JwtCodec::new(jwt_secret) }
    }

    /// Verify an email/password pair and issue a token for the matching
    /// account.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .store
            .get_user_by_email(email)?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        let role = Role::from_wire(&user.role)
            .ok_or_else(|| AuthError::UnknownSubject(user.uid.clone()))?;
        let token = self.jwt.issue(&user.uid)?;
        Ok(LoginResult {
            token,
            principal: Principal { subject_id: user.uid, role },
        })
    }

    /// Register a new local account with a hashed password. Used by the
    /// CLI seeding command, not the public HTTP surface.
    pub fn register(
        &self,
        uid: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<(), AuthError> {
        self.store.insert_user(&UserRecord {
            uid: uid.to_string(),
            email: email.to_string(),
            role: role.as_wire().to_string(),
            password_hash: hash_password(password),
        })?;
        Ok(())
    }

    /// Resolve a verified subject id back to its full [`Principal`].
    pub fn principal_for(&self, subject_id: &str) -> Result<Principal, AuthError> {
        let role = self.role_for(subject_id)?;
        Ok(Principal { subject_id: subject_id.to_string(), role })
    }
}

impl TokenVerifier for LocalIdentityProvider {
    fn verify(&self, token: &str) -> Result<String, AuthError> {
        self.jwt.verify(token)
    }
}

impl RoleLookup for LocalIdentityProvider {
    /// A subject with no local account record, or an unrecognized stored
    /// role string, resolves to [`Role::Viewer`] rather than an error — a
    /// verified token for an account the role store doesn't (or no longer)
    /// know about still gets read-only access by default.
    fn role_for(&self, subject_id: &str) -> Result<Role, AuthError> {
        let role = match self.store.get_user_by_uid(subject_id)? {
            Some(user) => Role::from_wire(&user.role).unwrap_or(Role::Viewer),
            None => Role::Viewer,
        };
        Ok(role)
    }
}
