//! Upload envelopes and their paired aggregate-metrics snapshot.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::{Result, StoreError};
use crate::metrics::{AggregateMetrics, DataQualitySummary};

/// One ingest invocation, as recorded in `uploads`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UploadRecord {
    pub upload_id: String,
    pub processed: u32,
    pub referrals: u32,
    pub created_at: chrono::DateTime<Utc>,
}

pub struct UploadRepo;

impl UploadRepo {
    /// Insert the upload envelope and its aggregate-metrics snapshot in one
    /// call; both rows are written for the same upload, so there is no
    /// observable state where one exists without the other.
    pub fn insert(
        conn: &Connection,
        upload_id: &str,
        processed: u32,
        referrals: u32,
        aggregate: &AggregateMetrics,
        quality: &DataQualitySummary,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO uploads (upload_id, processed, referrals, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![upload_id, processed, referrals, Utc::now().to_rfc3339()],
        )?;
        conn.execute(
            "INSERT INTO metrics (upload_id, aggregate_json, quality_json)
             VALUES (?1, ?2, ?3)",
            params![
                upload_id,
                serde_json::to_string(aggregate)?,
                serde_json::to_string(quality)?,
            ],
        )?;
        Ok(())
    }

    pub fn get(conn: &Connection, upload_id: &str) -> Result<UploadRecord> {
        conn.query_row(
            "SELECT upload_id, processed, referrals, created_at FROM uploads WHERE upload_id = ?1",
            [upload_id],
            |row| {
                let created_at: String = row.get(3)?;
                Ok(UploadRecord {
                    upload_id: row.get(0)?,
                    processed: row.get(1)?,
                    referrals: row.get(2)?,
                    created_at: created_at
                        .parse()
                        .unwrap_or_else(|_| Utc::now()),
                })
            },
        )
        .optional()?
        .ok_or_else(|| StoreError::InvalidOperation(format!("no upload with id `{upload_id}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::connection::{new_in_memory, ConnectionConfig};
    use crate::sqlite::migrations::run_migrations;

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
    fn insert_then_get_round_trips() {
        let conn = test_conn();
        let agg = AggregateMetrics::default();
        let quality = DataQualitySummary::default();
        UploadRepo::insert(&*conn, "u1", 10, 3, &agg, &quality).unwrap();

        let record = UploadRepo::get(&*conn, "u1").unwrap();
        assert_eq!(record.upload_id, "u1");
        assert_eq!(record.processed, 10);
        assert_eq!(record.referrals, 3);
    }

    #[test]
    fn get_missing_upload_errors() {
        let conn = test_conn();
        assert!(UploadRepo::get(&*conn, "missing").is_err());
    }
}
