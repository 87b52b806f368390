//! The auth gate: bearer-token extraction, verification, and role-based
//! admission, attached to protected routes via
//! `axum::middleware::from_fn_with_state`.
//!
//! Extraction is done against the raw header rather than through a typed
//! extractor so a missing/malformed token always surfaces as this crate's
//! `Unauthorized` mapping, not an extractor's own rejection response.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use referral_auth::{Principal, Role, RoleLookup, TokenVerifier};
use referral_core::CoreError;

use crate::error::ApiError;
use crate::state::AppState;

/// Require a verified bearer token. Any resolvable role passes; use
/// [`require_admin`] for admin-only routes. Attaches the resolved
/// [`Principal`] to the request extensions for downstream handlers and
/// records its subject id onto the active tracing span.
pub async fn require_viewer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = authenticate(&state, &request)?;
    tracing::Span::current().record("subject_id", tracing::field::display(&principal.subject_id));
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// As [`require_viewer`], additionally rejecting non-admin principals with
/// `Forbidden`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = authenticate(&state, &request)?;
    if principal.role != Role::Admin {
        return Err(ApiError(CoreError::forbidden("admin role required")));
    }
    tracing::Span::current().record("subject_id", tracing::field::display(&principal.subject_id));
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn authenticate(state: &AppState, request: &Request) -> Result<Principal, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError(CoreError::unauthorized("missing bearer token")))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError(CoreError::unauthorized("expected a bearer token")))?;

    let subject_id = state.identity.verify(token).map_err(CoreError::from)?;
    let role = state.identity.role_for(&subject_id).map_err(CoreError::from)?;
    Ok(Principal { subject_id, role })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use axum::routing::get;
    use referral_settings::AppEnv;
    use referral_store::StoreAdapter;
    use referral_store::sqlite::connection::ConnectionConfig;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let store = StoreAdapter::open_in_memory(&ConnectionConfig::default()).unwrap();
        let identity = Arc::new(referral_auth::LocalIdentityProvider::new(
            store.clone(),
            "test-secret",
        ));
        identity
            .register("u1", "a@example.com", "pw", Role::Viewer)
            .unwrap();
        AppState { store, identity, environment: AppEnv::Test }
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/protected", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                require_viewer,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = router(test_state());
        let request = Request::builder()
            .method(Method::GET)
            .uri("/protected")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_passes_through() {
        let state = test_state();
        let result = state.identity.login("a@example.com", "pw").unwrap();
        let app = router(state);

        let request = Request::builder()
            .method(Method::GET)
            .uri("/protected")
            .header(AUTHORIZATION, format!("Bearer {}", result.token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
