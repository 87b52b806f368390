//! Keyed reads and inserts for the `events` table.

use chrono::{DateTime, Utc};
use referral_core::{Event, EventType, ReferralId};
use rusqlite::{params, Connection};

use crate::errors::{Result, StoreError};

pub struct EventRepo;

fn event_type_str(event_type: EventType) -> &'static str {
    match event_type {
        EventType::StatusUpdate => "STATUS_UPDATE",
        EventType::AppointmentSet => "APPOINTMENT_SET",
        EventType::AppointmentCancelled => "APPOINTMENT_CANCELLED",
    }
}

fn event_type_from_str(s: &str) -> Result<EventType> {
    match s {
        "STATUS_UPDATE" => Ok(EventType::StatusUpdate),
        "APPOINTMENT_SET" => Ok(EventType::AppointmentSet),
        "APPOINTMENT_CANCELLED" => Ok(EventType::AppointmentCancelled),
        other => Err(StoreError::InvalidOperation(format!(
            "unrecognized event_type `{other}` in storage"
        ))),
    }
}

impl EventRepo {
    /// Insert or overwrite one event, keyed by `(referral_id, seq)`.
    pub fn insert(
        conn: &Connection,
        event: &Event,
        upload_id: &str,
        imported_at: DateTime<Utc>,
    ) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO events
                (referral_id, seq, event_type, payload, upload_id, imported_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.referral_id.as_str(),
                event.seq,
                event_type_str(event.event_type),
                event.payload.to_string(),
                upload_id,
                imported_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All events for one referral, ascending by `seq`.
    pub fn get_by_referral(conn: &Connection, referral_id: &ReferralId) -> Result<Vec<Event>> {
        let mut stmt = conn.prepare(
            "SELECT referral_id, seq, event_type, payload
             FROM events WHERE referral_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map([referral_id.as_str()], |row| {
            let referral_id: String = row.get(0)?;
            let seq: i64 = row.get(1)?;
            let event_type: String = row.get(2)?;
            let payload: String = row.get(3)?;
            Ok((referral_id, seq, event_type, payload))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (referral_id, seq, event_type, payload) = row?;
            events.push(Event {
                referral_id: referral_id.into(),
                seq,
                event_type: event_type_from_str(&event_type)?,
                payload: serde_json::from_str(&payload)?,
            });
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::connection::{new_in_memory, ConnectionConfig};
    use crate::sqlite::migrations::run_migrations;
    use serde_json::json;

    fn test_conn() -> crate::sqlite::connection::PooledConnection {
        let pool = new_in_memory(&ConnectionConfig {
            pool_size: 1,
            ..ConnectionConfig::default()
        })
        .unwrap();
        let mut conn = pool.get().unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn insert_then_read_back_ascending_by_seq() {
        let conn = test_conn();
        let e2 = Event {
            referral_id: "R1".into(),
            seq: 2,
            event_type: EventType::StatusUpdate,
            payload: json!({"status": "SENT"}),
        };
        let e1 = Event {
            referral_id: "R1".into(),
            seq: 1,
            event_type: EventType::StatusUpdate,
            payload: json!({"status": "CREATED"}),
        };
        EventRepo::insert(&*conn, &e2, "u1", Utc::now()).unwrap();
        EventRepo::insert(&*conn, &e1, "u1", Utc::now()).unwrap();

        let events = EventRepo::get_by_referral(&*conn, &"R1".into()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq, 1);
        assert_eq!(events[1].seq, 2);
    }

    #[test]
    fn insert_is_idempotent_on_same_key() {
        let conn = test_conn();
        let e = Event {
            referral_id: "R1".into(),
            seq: 1,
            event_type: EventType::StatusUpdate,
            payload: json!({"status": "SENT"}),
        };
        EventRepo::insert(&*conn, &e, "u1", Utc::now()).unwrap();
        EventRepo::insert(&*conn, &e, "u2", Utc::now()).unwrap();
        assert_eq!(EventRepo::get_by_referral(&*conn, &"R1".into()).unwrap().len(), 1);
    }
}
