//! `GET /referrals` and `GET /referrals/:id`.

use axum::Json;
use axum::extract::{Path, State};
use referral_core::CoreError;
use referral_store::ReferralState;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Referrals are capped at this many rows per `GET /referrals` call.
const LIST_LIMIT: u32 = 100;

#[derive(Serialize)]
pub struct ReferralListResponse {
    pub referrals: Vec<ReferralState>,
}

pub async fn list_referrals(
    State(state): State<AppState>,
) -> Result<Json<ReferralListResponse>, ApiError> {
    let referrals = state.store.list_referrals(LIST_LIMIT).map_err(CoreError::from)?;
    Ok(Json(ReferralListResponse { referrals }))
}

pub async fn get_referral(
    State(state): State<AppState>,
    Path(referral_id): Path<String>,
) -> Result<Json<ReferralState>, ApiError> {
    let state_doc = state
        .store
        .get_referral(&referral_id.into())
        .map_err(CoreError::from)?;
    Ok(Json(state_doc))
}
