//! The reconciled view of a referral: [`ReferralState`], its appointment
//! mapping, and the per-referral data-quality counters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use referral_core::{ApptId, Event, ReferralId, Status};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One appointment as last known: its id and scheduled start time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub appt_id: ApptId,
    pub start_time: DateTime<Utc>,
}

/// An appointment mapping entry. `Cancelled` retains the appointment's last
/// known `start_time` (rather than being erased) so a later resurrection via
/// `APPOINTMENT_SET` can be compared against its pre-cancellation value — see
/// DESIGN.md for why this, rather than discarding it, is the rule this
/// engine applies.
///
/// This internal richness is deliberately not what crosses the wire: the
/// documented `appointments` shape is `<appt_id>: null | {appt_id,
/// start_time}` (§6), so [`Serialize`]/[`Deserialize`] are hand-written to
/// present `Cancelled` as `null` and `Present` as the bare appointment
/// object, matching every reader of `ReferralState` — the HTTP responses and
/// the SQLite read-model column alike.
#[derive(Clone, Debug, PartialEq)]
pub enum AppointmentSlot {
    Present(Appointment),
    Cancelled(Appointment),
}

impl AppointmentSlot {
    #[must_use]
    pub fn appointment(&self) -> &Appointment {
        match self {
            Self::Present(a) | Self::Cancelled(a) => a,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl Serialize for AppointmentSlot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Present(appt) => appt.serialize(serializer),
            Self::Cancelled(_) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for AppointmentSlot {
    /// A `null` deserializes to a cancelled slot whose pre-cancellation
    /// `start_time` is unrecoverable from the wire (the contract documents
    /// it as `null`, not a tombstone object) — it round-trips back out as
    /// `null` and is never consulted by `select_active`, which always
    /// excludes cancelled slots.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Appointment>::deserialize(deserializer)? {
            Some(appt) => Self::Present(appt),
            None => Self::Cancelled(Appointment {
                appt_id: ApptId::new(""),
                start_time: DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_else(Utc::now),
            }),
        })
    }
}

/// Per-referral data-quality counters, all non-negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralMetrics {
    /// Raw events dropped during deduplication for this referral.
    pub duplicates: u32,
    /// Sum over consecutive retained events of `max(0, seq[i+1] - seq[i] - 1)`.
    pub seq_gaps: u32,
    /// Terminal-to-terminal status transitions applied.
    pub terminal_overrides: u32,
    /// Appointment resets where `start_time` changed on an existing id.
    pub reschedules: u32,
    /// Appointments marked cancelled.
    pub cancelled_appts: u32,
}

/// The reconciled view of one referral: the output of replaying its
/// deduplicated, `seq`-ordered events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferralState {
    pub referral_id: ReferralId,
    pub status: Status,
    pub active_appointment: Option<Appointment>,
    pub appointments: BTreeMap<ApptId, AppointmentSlot>,
    /// The deduplicated, `seq`-sorted event sequence actually applied.
    pub events: Vec<Event>,
    pub metrics: ReferralMetrics,
}

/// The output of the reconciliation engine: every referral mentioned in the
/// input, keyed by id. A `BTreeMap` so iteration order — and therefore any
/// serialization of the whole map — is deterministic.
pub type ReconciledMap = BTreeMap<ReferralId, ReferralState>;
