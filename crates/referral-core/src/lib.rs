//! # referral-core
//!
//! Foundation types and the shared error hierarchy for the referral reconciler.
//!
//! This crate provides the vocabulary every other crate in the workspace depends on:
//!
//! - **Branded IDs**: `ReferralId`, `UploadId`, `ApptId` as newtypes for type safety
//! - **Events**: `Event`, `EventType`, `AppointmentPayload` — the canonical
//!   input shape, and [`parse_batch`] which is the single place raw JSON is
//!   validated into them
//! - **Errors**: [`CoreError`] hierarchy via `thiserror`, with the HTTP status
//!   mapping described in the design notes living alongside each variant

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;

pub use errors::CoreError;
pub use events::{parse_batch, AppointmentPayload, Event, EventType, Status};
pub use ids::{ApptId, ReferralId, UploadId};
