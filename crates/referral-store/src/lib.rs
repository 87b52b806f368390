//! # referral-store
//!
//! The reconciliation engine, the metrics/data-quality summarizers, and the
//! `SQLite`-backed persistence adapter that together implement components
//! B, C, and D of the referral reconciler.
//!
//! - [`reconcile`]: the pure, total, deterministic event → state function.
//! - [`metrics`]: aggregate dashboard counts and the data-quality ranking,
//!   both pure functions over a [`types::ReconciledMap`].
//! - [`sqlite`]: the pooled connection manager, versioned migrations, and
//!   the per-table repositories.
//! - [`adapter`]: [`adapter::StoreAdapter`], the facade an ingest/read
//!   request handler actually calls — keyed reads plus the chunked batched
//!   writer described in the persistence-adapter design.

#![deny(unsafe_code)]

pub mod adapter;
pub mod errors;
pub mod metrics;
pub mod reconcile;
pub mod sqlite;
pub mod types;

pub use adapter::StoreAdapter;
pub use errors::StoreError;
pub use metrics::{aggregate_metrics, data_quality_summary, AggregateMetrics, DataQualitySummary};
pub use reconcile::reconcile;
pub use types::{Appointment, AppointmentSlot, ReconciledMap, ReferralMetrics, ReferralState};
