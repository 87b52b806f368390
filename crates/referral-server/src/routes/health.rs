//! `GET /health` — unauthenticated liveness probe.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthBody {
    status: &'static str,
    mode: referral_settings::AppEnv,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody { status: "ok", mode: state.environment })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_ok_and_the_configured_mode() {
        let store =
            referral_store::StoreAdapter::open_in_memory(&Default::default()).unwrap();
        let identity = std::sync::Arc::new(referral_auth::LocalIdentityProvider::new(
            store.clone(),
            "secret",
        ));
        let state = AppState { store, identity, environment: referral_settings::AppEnv::Test };
        let Json(body) = health(State(state)).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.mode, referral_settings::AppEnv::Test);
    }
}
