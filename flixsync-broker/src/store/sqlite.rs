//! SQLite-based storage implementation
//!
//! Backs both the shared identity table and the replay cache. The
//! `username` UNIQUE constraint lives here, not in application
//! pre-checks: both origins can race on profile completion.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    Identity, IdentityId, IdentityStore, ProfileFields, RedeemedToken, ReplayCache, StoreResult,
};
use crate::error::SyncError;
use crate::session::SessionId;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-based store implementing both IdentityStore and ReplayCache
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, SyncError> {
        let conn = Connection::open(path).map_err(|e| SyncError::Internal(e.to_string()))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| SyncError::Internal(e.to_string()))?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), SyncError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(|e| SyncError::Internal(e.to_string()))?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, SyncError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| SyncError::Internal(e.to_string()))?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(|e| SyncError::Internal(e.to_string()))
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), SyncError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Shared identity table; id is the immutable join key across
            -- both origins
            CREATE TABLE IF NOT EXISTS identities (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                username TEXT UNIQUE,
                credential_hash TEXT,
                country TEXT,
                avatar_url TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_identities_email ON identities(email);

            -- Redeemed sync tokens, keyed by token id
            CREATE TABLE IF NOT EXISTS redeemed_tokens (
                jti TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                redeemed_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| SyncError::Internal(e.to_string()))
    }

    fn row_to_identity(row: &Row<'_>) -> rusqlite::Result<Identity> {
        let created_at: String = row.get(6)?;
        Ok(Identity {
            id: IdentityId(row.get(0)?),
            email: row.get(1)?,
            username: row.get(2)?,
            credential_hash: row.get(3)?,
            country: row.get(4)?,
            avatar_url: row.get(5)?,
            created_at: parse_timestamp(&created_at),
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::UNIX_EPOCH)
}

fn map_sqlite_err(e: rusqlite::Error) -> SyncError {
    if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation
            && msg
                .as_deref()
                .map_or(false, |m| m.contains("identities.username"))
        {
            return SyncError::UsernameTaken;
        }
    }
    SyncError::Internal(e.to_string())
}

const IDENTITY_COLUMNS: &str =
    "id, email, username, credential_hash, country, avatar_url, created_at";

impl IdentityStore for SqliteStore {
    fn find_by_id(&self, id: &IdentityId) -> StoreResult<Option<Identity>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?1"),
            params![id.0],
            Self::row_to_identity,
        )
        .optional()
        .map_err(map_sqlite_err)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = lower(?1) LIMIT 1"),
            params![email],
            Self::row_to_identity,
        )
        .optional()
        .map_err(map_sqlite_err)
    }

    fn find_by_id_and_email(
        &self,
        id: &IdentityId,
        email: &str,
    ) -> StoreResult<Option<Identity>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?1 AND email = lower(?2) LIMIT 1"
            ),
            params![id.0, email],
            Self::row_to_identity,
        )
        .optional()
        .map_err(map_sqlite_err)
    }

    fn upsert_identity(
        &self,
        id: &IdentityId,
        email: &str,
        fields: ProfileFields,
    ) -> StoreResult<Identity> {
        let normalized = email.to_lowercase();
        let conn = self.conn.lock().unwrap();

        let existing = conn
            .query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?1"),
                params![id.0],
                Self::row_to_identity,
            )
            .optional()
            .map_err(map_sqlite_err)?;

        let identity = match existing {
            Some(mut identity) => {
                identity.email = normalized;
                if let Some(username) = fields.username {
                    identity.username = Some(username);
                }
                if let Some(hash) = fields.credential_hash {
                    identity.credential_hash = Some(hash);
                }
                if let Some(country) = fields.country {
                    identity.country = Some(country);
                }
                if let Some(avatar_url) = fields.avatar_url {
                    identity.avatar_url = Some(avatar_url);
                }
                conn.execute(
                    "UPDATE identities
                     SET email = ?2, username = ?3, credential_hash = ?4,
                         country = ?5, avatar_url = ?6
                     WHERE id = ?1",
                    params![
                        identity.id.0,
                        identity.email,
                        identity.username,
                        identity.credential_hash,
                        identity.country,
                        identity.avatar_url,
                    ],
                )
                .map_err(map_sqlite_err)?;
                identity
            }
            None => {
                let identity = Identity {
                    id: id.clone(),
                    email: normalized,
                    username: fields.username,
                    credential_hash: fields.credential_hash,
                    country: fields.country,
                    avatar_url: fields.avatar_url,
                    created_at: Utc::now(),
                };
                conn.execute(
                    "INSERT INTO identities
                     (id, email, username, credential_hash, country, avatar_url, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        identity.id.0,
                        identity.email,
                        identity.username,
                        identity.credential_hash,
                        identity.country,
                        identity.avatar_url,
                        identity.created_at.to_rfc3339(),
                    ],
                )
                .map_err(map_sqlite_err)?;
                identity
            }
        };

        Ok(identity)
    }

    fn delete_identity(&self, id: &IdentityId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM identities WHERE id = ?1", params![id.0])
            .map_err(map_sqlite_err)?;
        Ok(())
    }
}

impl ReplayCache for SqliteStore {
    fn record(&self, jti: &str, session_id: &SessionId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO redeemed_tokens (jti, session_id, redeemed_at)
             VALUES (?1, ?2, ?3)",
            params![jti, session_id.0, Utc::now().to_rfc3339()],
        )
        .map_err(map_sqlite_err)?;
        Ok(())
    }

    fn lookup(&self, jti: &str) -> StoreResult<Option<RedeemedToken>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT jti, session_id, redeemed_at FROM redeemed_tokens WHERE jti = ?1",
            params![jti],
            |row| {
                let redeemed_at: String = row.get(2)?;
                Ok(RedeemedToken {
                    jti: row.get(0)?,
                    session_id: SessionId(row.get(1)?),
                    redeemed_at: parse_timestamp(&redeemed_at),
                })
            },
        )
        .optional()
        .map_err(map_sqlite_err)
    }

    fn cleanup_expired(&self, max_age_secs: i64) -> StoreResult<u64> {
        let cutoff = (Utc::now() - chrono::Duration::seconds(max_age_secs)).to_rfc3339();
        let conn = self.conn.lock().unwrap();
        let deleted = conn
            .execute(
                "DELETE FROM redeemed_tokens WHERE redeemed_at <= ?1",
                params![cutoff],
            )
            .map_err(map_sqlite_err)?;
        Ok(deleted as u64)
    }
}
