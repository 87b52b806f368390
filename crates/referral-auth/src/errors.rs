//! Auth error types, converging into `referral_core::CoreError` at the HTTP
//! boundary.

use referral_core::CoreError;

/// Failure modes of the local identity provider.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email/password pair did not match an account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token signature and shape were valid but it has expired.
    #[error("token expired")]
    TokenExpired,

    /// Token failed to parse or its signature did not verify.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Token verified but no account exists for the subject id it carries
    /// (deleted after issuance, or a role string the account no longer has).
    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    /// The persistence layer failed while looking up or writing an account.
    #[error("store failure: {0}")]
    Store(#[from] referral_store::StoreError),
}

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => CoreError::unauthorized("invalid email or password"),
            AuthError::TokenExpired | AuthError::MalformedToken(_) => {
                CoreError::unauthorized("invalid or expired token")
            }
            AuthError::UnknownSubject(_) => CoreError::unauthorized("unknown subject"),
            AuthError::Store(e) => CoreError::from(e),
        }
    }
}
