//! `POST /uploads` (admin) — parse, reconcile, persist.

use axum::Json;
use axum::extract::State;
use referral_core::{CoreError, UploadId, parse_batch};
use referral_store::{aggregate_metrics, data_quality_summary, reconcile};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct UploadResponse {
    pub upload_id: String,
    pub processed: usize,
    pub referrals: usize,
    pub metrics: referral_store::AggregateMetrics,
}

pub async fn create_upload(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<UploadResponse>, ApiError> {
    let events = parse_batch(&body)?;
    let reconciled = reconcile(&events);
    let aggregate = aggregate_metrics(&reconciled);
    let quality = data_quality_summary(&reconciled);

    let upload_id = UploadId::new();
    state
        .store
        .commit_upload(upload_id.as_str(), &events, &reconciled, &aggregate, &quality)
        .map_err(CoreError::from)?;

    tracing::info!(
        upload_id = upload_id.as_str(),
        processed = events.len(),
        referrals = reconciled.len(),
        "ingest committed"
    );

    Ok(Json(UploadResponse {
        upload_id: upload_id.into_inner(),
        processed: events.len(),
        referrals: reconciled.len(),
        metrics: aggregate,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use referral_store::StoreAdapter;
    use referral_store::sqlite::connection::ConnectionConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let store = StoreAdapter::open_in_memory(&ConnectionConfig::default()).unwrap();
        let identity = Arc::new(referral_auth::LocalIdentityProvider::new(
            store.clone(),
            "test-secret",
        ));
        AppState { store, identity, environment: referral_settings::AppEnv::Test }
    }

    #[tokio::test]
    async fn valid_batch_ingests_and_reports_counts() {
        let state = test_state();
        let body = json!([
            {"referral_id": "R1", "seq": 1, "type": "STATUS_UPDATE", "payload": {"status": "SENT"}}
        ]);
        let Json(response) = create_upload(State(state), Json(body)).await.unwrap();
        assert_eq!(response.processed, 1);
        assert_eq!(response.referrals, 1);
    }

    #[tokio::test]
    async fn malformed_batch_is_invalid_input() {
        let state = test_state();
        let body = json!([{"seq": 1, "type": "STATUS_UPDATE", "payload": {}}]);
        let err = create_upload(State(state), Json(body)).await.unwrap_err();
        assert_eq!(err.0.status_code(), 400);
    }
}
