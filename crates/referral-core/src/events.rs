//! Canonical event shape and the single validation boundary for raw ingest
//! bodies: [`parse_batch`].
//!
//! Payload fields are validated lazily: [`parse_batch`] only enforces the
//! envelope (`referral_id`, `seq`, a recognized `type`, and a payload object).
//! Whether a given event's payload actually carries the fields its `type`
//! needs (a `status` for `STATUS_UPDATE`, an `appt_id`/`start_time` for the
//! appointment events) is decided when the reconciliation engine replays it;
//! an event whose payload doesn't decode for its type is a no-op during
//! replay, not a batch-wide rejection. Only a structurally broken envelope —
//! bad JSON, a missing required field, an unrecognized `type` — rejects the
//! whole batch with [`CoreError::InvalidInput`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreError;
use crate::ids::{ApptId, ReferralId};

/// Referral lifecycle status. `Completed` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Initial status of every referral.
    Created,
    Sent,
    Acknowledged,
    Scheduled,
    /// Terminal.
    Completed,
    /// Terminal.
    Cancelled,
}

impl Status {
    /// Whether this status is terminal: once reached, only another terminal
    /// status may change `status`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }
}

/// The three event types the feed can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    StatusUpdate,
    AppointmentSet,
    AppointmentCancelled,
}

impl EventType {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "STATUS_UPDATE" => Some(Self::StatusUpdate),
            "APPOINTMENT_SET" => Some(Self::AppointmentSet),
            "APPOINTMENT_CANCELLED" => Some(Self::AppointmentCancelled),
            _ => None,
        }
    }
}

/// A typed, successfully-decoded payload for one event. Produced on demand
/// by [`Event::status_payload`] / [`Event::appointment_payload`]; a payload
/// that fails to decode for its event's type is simply `None`, not an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppointmentPayload {
    pub appt_id: ApptId,
    pub start_time: DateTime<Utc>,
}

/// An immutable event, uniquely identified by `(referral_id, seq)`.
///
/// The raw `payload` is kept as JSON rather than a pre-decoded sum type so
/// that unknown fields survive untouched for audit/history display, per the
/// module's validation policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub referral_id: ReferralId,
    pub seq: i64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: Value,
}

impl Event {
    /// Decode this event's payload as a `STATUS_UPDATE` status, if it both
    /// is one and carries a recognized `status` field.
    #[must_use]
    pub fn status_payload(&self) -> Option<Status> {
        if self.event_type != EventType::StatusUpdate {
            return None;
        }
        self.payload
            .get("status")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Decode this event's payload as an appointment reference, if it is an
    /// `APPOINTMENT_SET` or `APPOINTMENT_CANCELLED` event carrying at least
    /// a non-empty `appt_id`. `start_time` is required for `APPOINTMENT_SET`
    /// and ignored for `APPOINTMENT_CANCELLED`.
    #[must_use]
    pub fn appt_id(&self) -> Option<ApptId> {
        match self.event_type {
            EventType::AppointmentSet | EventType::AppointmentCancelled => self
                .payload
                .get("appt_id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(ApptId::from),
            EventType::StatusUpdate => None,
        }
    }

    /// Decode this event's `APPOINTMENT_SET` payload in full (`appt_id` and
    /// `start_time`), or `None` if it isn't one or is missing either field.
    #[must_use]
    pub fn appointment_set_payload(&self) -> Option<AppointmentPayload> {
        if self.event_type != EventType::AppointmentSet {
            return None;
        }
        let appt_id = self.appt_id()?;
        let start_time = self
            .payload
            .get("start_time")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))?;
        Some(AppointmentPayload {
            appt_id,
            start_time,
        })
    }
}

/// Parse a raw ingest body into a validated event list.
///
/// Accepts either a bare JSON array of event objects or `{"events": [...]}`.
/// Rejects the whole batch with [`CoreError::InvalidInput`] if the body is
/// neither shape, if any element is missing `referral_id`/`seq`/`type`, or
/// carries an unrecognized `type`. Payload-field validity is deferred to the
/// reconciliation engine (see module docs).
pub fn parse_batch(body: &Value) -> Result<Vec<Event>, CoreError> {
    let items = extract_items(body)?;
    items.iter().map(parse_one).collect()
}

fn extract_items(body: &Value) -> Result<&Vec<Value>, CoreError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(map) => map
            .get("events")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                CoreError::invalid_input(
                    "expected a bare array of events or an object with an `events` array",
                )
            }),
        _ => Err(CoreError::invalid_input(
            "expected a bare array of events or an object with an `events` array",
        )),
    }
}

fn parse_one(raw: &Value) -> Result<Event, CoreError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| CoreError::invalid_input("event must be a JSON object"))?;

    let referral_id = obj
        .get("referral_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::invalid_input("event missing non-empty `referral_id`"))?;

    let seq = obj
        .get("seq")
        .and_then(Value::as_i64)
        .ok_or_else(|| CoreError::invalid_input("event missing integer `seq`"))?;
    if seq < 0 {
        return Err(CoreError::invalid_input("`seq` must be non-negative"));
    }

    let type_str = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::invalid_input("event missing `type`"))?;
    let event_type = EventType::from_wire(type_str)
        .ok_or_else(|| CoreError::invalid_input(format!("unknown event type `{type_str}`")))?;

    let payload = obj
        .get("payload")
        .cloned()
        .ok_or_else(|| CoreError::invalid_input("event missing `payload`"))?;
    if !payload.is_object() {
        return Err(CoreError::invalid_input("`payload` must be an object"));
    }

    Ok(Event {
        referral_id: ReferralId::from(referral_id),
        seq,
        event_type,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_bare_array() {
        let body = json!([
            {"referral_id": "R1", "seq": 1, "type": "STATUS_UPDATE", "payload": {"status": "SENT"}}
        ]);
        let events = parse_batch(&body).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].referral_id.as_str(), "R1");
    }

    #[test]
    fn accepts_events_wrapper_object() {
        let body = json!({"events": [
            {"referral_id": "R1", "seq": 1, "type": "STATUS_UPDATE", "payload": {"status": "SENT"}}
        ]});
        assert_eq!(parse_batch(&body).unwrap().len(), 1);
    }

    #[test]
    fn rejects_unknown_type() {
        let body = json!([
            {"referral_id": "R1", "seq": 1, "type": "BOGUS", "payload": {}}
        ]);
        assert_matches::assert_matches!(parse_batch(&body), Err(CoreError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_missing_referral_id() {
        let body = json!([{"seq": 1, "type": "STATUS_UPDATE", "payload": {}}]);
        assert_matches::assert_matches!(parse_batch(&body), Err(CoreError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_negative_seq() {
        let body = json!([{"referral_id": "R1", "seq": -1, "type": "STATUS_UPDATE", "payload": {}}]);
        assert_matches::assert_matches!(parse_batch(&body), Err(CoreError::InvalidInput { .. }));
    }

    #[test]
    fn unrecognized_payload_fields_are_preserved_not_rejected() {
        let body = json!([
            {"referral_id": "R1", "seq": 1, "type": "STATUS_UPDATE",
             "payload": {"status": "SENT", "extra": "anomaly"}}
        ]);
        let events = parse_batch(&body).unwrap();
        assert_eq!(events[0].payload.get("extra").unwrap(), "anomaly");
        assert_eq!(events[0].status_payload(), Some(Status::Sent));
    }

    #[test]
    fn malformed_status_payload_is_not_a_parse_error() {
        // missing `status` field entirely — parse_batch still accepts it;
        // the engine treats replay of this event as a no-op.
        let body = json!([
            {"referral_id": "R1", "seq": 1, "type": "STATUS_UPDATE", "payload": {}}
        ]);
        let events = parse_batch(&body).unwrap();
        assert_eq!(events[0].status_payload(), None);
    }

    #[test]
    fn appointment_set_payload_decodes_appt_id_and_start_time() {
        let body = json!([
            {"referral_id": "R1", "seq": 1, "type": "APPOINTMENT_SET",
             "payload": {"appt_id": "A1", "start_time": "2025-02-01T10:00:00Z"}}
        ]);
        let events = parse_batch(&body).unwrap();
        let payload = events[0].appointment_set_payload().unwrap();
        assert_eq!(payload.appt_id.as_str(), "A1");
    }
}
