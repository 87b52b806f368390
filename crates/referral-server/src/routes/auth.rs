//! `POST /auth/login` and `GET /auth/me`.

use axum::Extension;
use axum::Json;
use axum::extract::State;
use referral_auth::{Principal, RoleLookup};
use referral_core::CoreError;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub uid: String,
    pub role: referral_auth::Role,
}

/// Proxies credentials to the identity provider; returns a token envelope
/// or `Unauthorized`.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let result = state
        .identity
        .login(&body.email, &body.password)
        .map_err(CoreError::from)?;
    Ok(Json(LoginResponse {
        token: result.token,
        uid: result.principal.subject_id,
        role: result.principal.role,
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub uid: String,
    pub email: String,
    pub role: referral_auth::Role,
}

/// Returns `{uid, email, role}` for the authenticated principal.
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<MeResponse>, ApiError> {
    let record = state
        .store
        .get_user_by_uid(&principal.subject_id)
        .map_err(CoreError::from)?
        .ok_or_else(|| CoreError::not_found("no such account"))?;
    let role = state
        .identity
        .role_for(&principal.subject_id)
        .map_err(CoreError::from)?;
    Ok(Json(MeResponse { uid: record.uid, email: record.email, role }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use referral_store::StoreAdapter;
    use referral_store::sqlite::connection::ConnectionConfig;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let store = StoreAdapter::open_in_memory(&ConnectionConfig::default()).unwrap();
        let identity = Arc::new(referral_auth::LocalIdentityProvider::new(
            store.clone(),
            "test-secret",
        ));
        identity
            .register("u1", "a@example.com", "pw", referral_auth::Role::Admin)
            .unwrap();
        AppState { store, identity, environment: referral_settings::AppEnv::Test }
    }

    #[tokio::test]
    async fn login_with_correct_credentials_issues_a_token() {
        let state = test_state();
        let body = LoginRequest { email: "a@example.com".into(), password: "pw".into() };
        let Json(response) = login(State(state), Json(body)).await.unwrap();
        assert_eq!(response.uid, "u1");
        assert!(!response.token.is_empty());
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let state = test_state();
        let body = LoginRequest { email: "a@example.com".into(), password: "nope".into() };
        let err = login(State(state), Json(body)).await.unwrap_err();
        assert_eq!(err.0.status_code(), 401);
    }

    #[tokio::test]
    async fn me_returns_the_account_for_the_principal() {
        let state = test_state();
        let principal = Principal { subject_id: "u1".into(), role: referral_auth::Role::Admin };
        let Json(response) = me(State(state), Extension(principal)).await.unwrap();
        assert_eq!(response.email, "a@example.com");
    }
}
