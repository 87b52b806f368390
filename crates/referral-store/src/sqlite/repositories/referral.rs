//! Keyed reads and full-overwrite upserts for the `referrals` read-model
//! table. Each row stores one referral's [`ReferralState`] as JSON; the
//! reconciled state is always written as a complete replacement, never
//! patched in place, matching the "latest wins" persistence rule.

use chrono::Utc;
use referral_core::ReferralId;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::{Result, StoreError};
use crate::types::ReferralState;

pub struct ReferralRepo;

impl ReferralRepo {
    /// Full overwrite of one referral's read-model.
    pub fn upsert(conn: &Connection, state: &ReferralState) -> Result<()> {
        let state_json = serde_json::to_string(state)?;
        conn.execute(
            "INSERT INTO referrals (referral_id, state_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(referral_id) DO UPDATE SET
                state_json = excluded.state_json,
                updated_at = excluded.updated_at",
            params![state.referral_id.as_str(), state_json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Fetch one referral's read-model, or `ReferralNotFound` if it has
    /// never been touched by an ingest.
    pub fn get(conn: &Connection, referral_id: &ReferralId) -> Result<ReferralState> {
        let state_json: Option<String> = conn
            .query_row(
                "SELECT state_json FROM referrals WHERE referral_id = ?1",
                [referral_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let state_json =
            state_json.ok_or_else(|| StoreError::ReferralNotFound(referral_id.to_string()))?;
        Ok(serde_json::from_str(&state_json)?)
    }

    /// List up to `limit` referrals, ordered by `referral_id` ascending so
    /// pagination (outside this crate's scope) has a stable cursor.
    pub fn list(conn: &Connection, limit: u32) -> Result<Vec<ReferralState>> {
        let mut stmt = conn.prepare(
            "SELECT state_json FROM referrals ORDER BY referral_id ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(serde_json::from_str(&row?)?);
        }
        Ok(out)
    }
}
