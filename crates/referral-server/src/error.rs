//! Maps [`CoreError`] onto the wire error shape (`{code, message}`) and the
//! status codes in the error-handling design.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use referral_core::CoreError;
use serde::Serialize;

/// A request handler's error type. Every handler returns
/// `Result<_, ApiError>`; `?` on any `CoreError`-convertible error composes
/// straight through to the HTTP response.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl<E> From<E> for ApiError
where
    E: Into<CoreError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: String,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = &self.0;
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match err {
            CoreError::UpstreamFailure { .. } => {
                tracing::error!(error = %err, "upstream failure");
            }
            CoreError::InvalidInput { .. } => {
                tracing::debug!(error = %err, "rejected invalid input");
            }
            _ => {
                tracing::debug!(error = %err, "request rejected");
            }
        }

        let body = ErrorBody {
            code: err.code().to_string(),
            message: err.client_message(),
        };
        (status, Json(body)).into_response()
    }
}
