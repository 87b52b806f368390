//! The shared error hierarchy every fallible operation in this workspace
//! resolves into.
//!
//! [`CoreError`] has exactly the five kinds the HTTP surface distinguishes
//! (see the design notes for the status-code mapping): callers elsewhere in
//! the workspace define their own error types for the details specific to
//! their layer (persistence, auth) and implement `From<_> for CoreError` so
//! `?` composes cleanly up to the request handler.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Error kinds exposed across the HTTP boundary, one per row of the mapping
/// in the design notes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed request body, a missing required field, or an unknown event
    /// `type`. Maps to HTTP 400.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Human-readable explanation, safe to show to the caller.
        message: String,
    },

    /// Missing or invalid bearer token. Maps to HTTP 401.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Human-readable explanation, safe to show to the caller.
        message: String,
    },

    /// Authenticated but the principal's role does not permit the operation.
    /// Maps to HTTP 403.
    #[error("forbidden: {message}")]
    Forbidden {
        /// Human-readable explanation, safe to show to the caller.
        message: String,
    },

    /// The referenced entity does not exist. Maps to HTTP 404.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable explanation, safe to show to the caller.
        message: String,
    },

    /// The identity provider or the document store failed. Maps to HTTP 500
    /// with a generic message; the real cause is attached via `source` and
    /// logged, never serialized to the client.
    #[error("upstream failure: {message}")]
    UpstreamFailure {
        /// Generic, client-safe message. Never includes the source's detail.
        message: String,
        /// Extra structured context for the log line (request id, operation
        /// name, ...). Not serialized to the client.
        context: HashMap<String, serde_json::Value>,
        /// The underlying error, if any, attached for logging only.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// The wire code attached to every error response, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// [`CoreError::InvalidInput`]
    InvalidInput,
    /// [`CoreError::Unauthorized`]
    Unauthorized,
    /// [`CoreError::Forbidden`]
    Forbidden,
    /// [`CoreError::NotFound`]
    NotFound,
    /// [`CoreError::UpstreamFailure`]
    UpstreamFailure,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::UpstreamFailure => "UPSTREAM_FAILURE",
        };
        f.write_str(s)
    }
}

impl CoreError {
    /// Construct an [`CoreError::InvalidInput`].
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Construct an [`CoreError::Unauthorized`].
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Construct an [`CoreError::Forbidden`].
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Construct an [`CoreError::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Construct an [`CoreError::UpstreamFailure`] with no attached source.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFailure {
            message: message.into(),
            context: HashMap::new(),
            source: None,
        }
    }

    /// Attach the underlying error for logging. Only meaningful on
    /// [`CoreError::UpstreamFailure`]; a no-op on every other variant.
    #[must_use]
    pub fn with_source(mut self, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        if let Self::UpstreamFailure { source, .. } = &mut self {
            *source = Some(Box::new(err));
        }
        self
    }

    /// Attach structured logging context. Only meaningful on
    /// [`CoreError::UpstreamFailure`]; a no-op on every other variant.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Self::UpstreamFailure { context, .. } = &mut self {
            if let Ok(v) = serde_json::to_value(value) {
                let _ = context.insert(key.into(), v);
            }
        }
        self
    }

    /// The stable wire code for this error kind.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::UpstreamFailure { .. } => ErrorCode::UpstreamFailure,
        }
    }

    /// The HTTP status code this error maps to.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::UpstreamFailure { .. } => 500,
        }
    }

    /// The message safe to return to the caller. For `UpstreamFailure` this
    /// is deliberately generic; the source error is never exposed here.
    #[must_use]
    pub fn client_message(&self) -> &str {
        match self {
            Self::InvalidInput { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::UpstreamFailure { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_the_design_mapping() {
        assert_eq!(CoreError::invalid_input("x").status_code(), 400);
        assert_eq!(CoreError::unauthorized("x").status_code(), 401);
        assert_eq!(CoreError::forbidden("x").status_code(), 403);
        assert_eq!(CoreError::not_found("x").status_code(), 404);
        assert_eq!(CoreError::upstream("x").status_code(), 500);
    }

    #[test]
    fn error_codes_render_screaming_snake_case() {
        assert_eq!(ErrorCode::InvalidInput.to_string(), "INVALID_INPUT");
        assert_eq!(ErrorCode::UpstreamFailure.to_string(), "UPSTREAM_FAILURE");
    }

    #[test]
    fn upstream_failure_carries_source_for_logging_only() {
        let io_err = std::io::Error::other("disk full");
        let err = CoreError::upstream("storage unavailable").with_source(io_err);
        assert_eq!(err.client_message(), "storage unavailable");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn non_upstream_variants_ignore_with_source() {
        let err = CoreError::not_found("no such referral").with_source(std::io::Error::other("x"));
        assert!(std::error::Error::source(&err).is_none());
    }
}
