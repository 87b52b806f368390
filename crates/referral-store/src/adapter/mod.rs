//! The facade an ingest or read request handler actually calls: keyed reads
//! over the `referrals`/`events` tables, plus [`StoreAdapter::commit_upload`],
//! the chunked batched write that lands one upload's reconciled state.

pub mod batch;

use chrono::Utc;
use referral_core::{Event, ReferralId};

use crate::errors::Result;
use crate::metrics::{AggregateMetrics, DataQualitySummary};
use crate::sqlite::connection::{ConnectionConfig, ConnectionPool};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::event::EventRepo;
use crate::sqlite::repositories::referral::ReferralRepo;
use crate::sqlite::repositories::upload::{UploadRecord, UploadRepo};
use crate::sqlite::repositories::user::{UserRecord, UserRepo};
use crate::types::ReferralState;
use batch::BatchWriter;

/// The persistence adapter: a pooled connection plus the repositories and
/// batched writer layered over it. Cheap to clone (the pool is an `Arc`
/// internally), so one instance is shared across request handlers.
#[derive(Clone)]
pub struct StoreAdapter {
    pool: ConnectionPool,
}

impl StoreAdapter {
    /// Open (or create) the `SQLite` file at `path`, running any pending
    /// migrations before returning.
    pub fn open_file(path: &str, config: &ConnectionConfig) -> Result<Self> {
        let pool = crate::sqlite::connection::new_file(path, config)?;
        Self::from_pool(pool)
    }

    /// A shared, process-local in-memory database, for `:memory:` deployments
    /// and tests.
    pub fn open_in_memory(config: &ConnectionConfig) -> Result<Self> {
        let pool = crate::sqlite::connection::new_in_memory(config)?;
        Self::from_pool(pool)
    }

    fn from_pool(pool: ConnectionPool) -> Result<Self> {
        run_migrations(&mut pool.get()?)?;
        Ok(Self { pool })
    }

    /// Persist the outcome of one ingest: the upload envelope, its paired
    /// aggregate/quality metrics snapshot, every retained event, and a
    /// full-overwrite read-model row per touched referral. All writes are
    /// enqueued on one [`BatchWriter`] and committed together, in chunks of
    /// at most [`batch::MAX_CHUNK_SIZE`] operations.
    pub fn commit_upload(
        &self,
        upload_id: &str,
        events: &[Event],
        reconciled: &crate::types::ReconciledMap,
        aggregate: &AggregateMetrics,
        quality: &DataQualitySummary,
    ) -> Result<()> {
        let mut writer = BatchWriter::new();
        let imported_at = Utc::now();

        {
            let upload_id = upload_id.to_string();
            let aggregate = aggregate.clone();
            let quality = quality.clone();
            let processed = events.len() as u32;
            let referrals = reconciled.len() as u32;
            writer.set(move |conn| {
                UploadRepo::insert(conn, &upload_id, processed, referrals, &aggregate, &quality)
                    .map_err(store_error_to_sqlite)
            });
        }

        for event in events {
            let event = event.clone();
            let upload_id = upload_id.to_string();
            writer.set(move |conn| {
                EventRepo::insert(conn, &event, &upload_id, imported_at)
                    .map_err(store_error_to_sqlite)
            });
        }

        for state in reconciled.values() {
            let state = state.clone();
            writer.set(move |conn| ReferralRepo::upsert(conn, &state).map_err(store_error_to_sqlite));
        }

        writer.commit(&self.pool)
    }

    /// Fetch one referral's reconciled read-model.
    pub fn get_referral(&self, referral_id: &ReferralId) -> Result<ReferralState> {
        ReferralRepo::get(&self.pool.get()?, referral_id)
    }

    /// List up to `limit` referrals, ordered by id.
    pub fn list_referrals(&self, limit: u32) -> Result<Vec<ReferralState>> {
        ReferralRepo::list(&self.pool.get()?, limit)
    }

    /// The raw event log for one referral, ascending by `seq`.
    pub fn get_events(&self, referral_id: &ReferralId) -> Result<Vec<Event>> {
        EventRepo::get_by_referral(&self.pool.get()?, referral_id)
    }

    /// The most recent upload envelope and its metrics snapshot.
    pub fn get_upload(&self, upload_id: &str) -> Result<UploadRecord> {
        UploadRepo::get(&self.pool.get()?, upload_id)
    }

    /// Register a local account (used by the bundled identity provider's
    /// seeding path, not by the public HTTP surface).
    pub fn insert_user(&self, user: &UserRecord) -> Result<()> {
        UserRepo::insert(&self.pool.get()?, user)
    }

    /// Look up a local account by the subject id a verified token carries.
    pub fn get_user_by_uid(&self, uid: &str) -> Result<Option<UserRecord>> {
        UserRepo::get_by_uid(&self.pool.get()?, uid)
    }

    /// Look up a local account by email, for password-based login.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        UserRepo::get_by_email(&self.pool.get()?, email)
    }
}

/// [`BatchWriter`] ops run against a plain `rusqlite::Connection` and must
/// return `rusqlite::Error`; this unwraps a `StoreError` back down to the
/// `rusqlite::Error` it (almost always) wraps, or reports it as a custom
/// SQLite user function failure otherwise.
fn store_error_to_sqlite(err: crate::errors::StoreError) -> rusqlite::Error {
    match err {
        crate::errors::StoreError::Sqlite(e) => e,
        other => rusqlite::Error::UserFunctionError(Box::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::reconcile;
    use referral_core::EventType;
    use serde_json::json;

    fn sample_events(referral_id: &str) -> Vec<Event> {
        vec![
            Event {
                referral_id: referral_id.into(),
                seq: 1,
                event_type: EventType::StatusUpdate,
                payload: json!({"status": "CREATED"}),
            },
            Event {
                referral_id: referral_id.into(),
                seq: 2,
                event_type: EventType::StatusUpdate,
                payload: json!({"status": "SENT"}),
            },
        ]
    }

    #[test]
    fn commit_upload_lands_events_metrics_and_referrals() {
        let adapter = StoreAdapter::open_in_memory(&ConnectionConfig::default()).unwrap();
        let events = sample_events("R1");
        let reconciled = reconcile(&events);
        let aggregate = crate::metrics::aggregate_metrics(&reconciled);
        let quality = crate::metrics::data_quality_summary(&reconciled);

        adapter
            .commit_upload("U1", &events, &reconciled, &aggregate, &quality)
            .unwrap();

        let state = adapter.get_referral(&"R1".into()).unwrap();
        assert_eq!(state.status, referral_core::Status::Sent);

        let stored_events = adapter.get_events(&"R1".into()).unwrap();
        assert_eq!(stored_events.len(), 2);

        let upload = adapter.get_upload("U1").unwrap();
        assert_eq!(upload.processed, 2);
        assert_eq!(upload.referrals, 1);
    }

    #[test]
    fn get_referral_not_found_before_any_ingest() {
        let adapter = StoreAdapter::open_in_memory(&ConnectionConfig::default()).unwrap();
        assert!(adapter.get_referral(&"R404".into()).is_err());
    }

    #[test]
    fn list_referrals_reflects_committed_uploads() {
        let adapter = StoreAdapter::open_in_memory(&ConnectionConfig::default()).unwrap();
        for id in ["R1", "R2"] {
            let events = sample_events(id);
            let reconciled = reconcile(&events);
            let aggregate = crate::metrics::aggregate_metrics(&reconciled);
            let quality = crate::metrics::data_quality_summary(&reconciled);
            adapter
                .commit_upload(id, &events, &reconciled, &aggregate, &quality)
                .unwrap();
        }
        assert_eq!(adapter.list_referrals(100).unwrap().len(), 2);
    }

    #[test]
    fn user_round_trips_by_uid_and_email() {
        let adapter = StoreAdapter::open_in_memory(&ConnectionConfig::default()).unwrap();
        adapter
            .insert_user(&UserRecord {
                uid: "u1".into(),
                email: "a@example.com".into(),
                role: "admin".into(),
                password_hash: "hash".into(),
            })
            .unwrap();
        assert!(adapter.get_user_by_uid("u1").unwrap().is_some());
        assert!(adapter.get_user_by_email("a@example.com").unwrap().is_some());
    }
}
