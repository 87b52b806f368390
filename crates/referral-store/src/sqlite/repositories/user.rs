//! The `users` table backing the bundled local identity-provider
//! implementation (see `referral-auth`). Role is stored as its wire string
//! (`"admin"` / `"viewer"`) rather than an enum from this crate, so
//! `referral-store` has no dependency on the auth crate's types.

use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::{Result, StoreError};

/// One row of `users`: a local account with its resolved role and password
/// hash. `uid` is the subject id a verified token carries.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
}

pub struct UserRepo;

impl UserRepo {
    /// Insert a new user. Fails with [`StoreError::InvalidOperation`] if the
    /// email is already taken (enforced by the `users.email` unique index).
    pub fn insert(conn: &Connection, user: &UserRecord) -> Result<()> {
        conn.execute(
            "INSERT INTO users (uid, email, role, password_hash) VALUES (?1, ?2, ?3, ?4)",
            params![user.uid, user.email, user.role, user.password_hash],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::InvalidOperation(format!("email `{}` is already registered", user.email))
            }
            other => StoreError::Sqlite(other),
        })?;
        Ok(())
    }

    /// Look up a user by subject id (the `uid` a verified token carries).
    pub fn get_by_uid(conn: &Connection, uid: &str) -> Result<Option<UserRecord>> {
        conn.query_row(
            "SELECT uid, email, role, password_hash FROM users WHERE uid = ?1",
            [uid],
            |row| {
                Ok(UserRecord {
                    uid: row.get(0)?,
                    email: row.get(1)?,
                    role: row.get(2)?,
                    password_hash: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// Look up a user by email, used by `/auth/login` to find the account
    /// to check the submitted password against.
    pub fn get_by_email(conn: &Connection, email: &str) -> Result<Option<UserRecord>> {
        conn.query_row(
            "SELECT uid, email, role, password_hash FROM users WHERE email = ?1",
            [email],
            |row| {
                Ok(UserRecord {
                    uid: row.get(0)?,
                    email: row.get(1)?,
                    role: row.get(2)?,
                    password_hash: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(StoreError::from)
    }
}
