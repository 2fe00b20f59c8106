// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session store contract shared by all backends.

use chrono::Duration;

use crate::models::{SessionId, SessionPatch, SessionRecord};

/// Session lifetime in seconds, matching the cookie `Max-Age` (7 days).
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7;

/// [`SESSION_TTL_SECS`] as a chrono duration.
pub fn session_ttl() -> Duration {
    Duration::seconds(SESSION_TTL_SECS)
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store lock poisoned")]
    Poisoned,

    #[error("redb database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Keyed storage of session records.
///
/// "Not found" is a normal outcome (`Ok(None)`), never an error. An expired
/// record is reported as not found. `merge` must be atomic per session id:
/// two concurrent merges on one id both land.
pub trait SessionStore: Send + Sync {
    /// Allocate a fresh, unused identifier and store `initial` under it.
    fn create(&self, initial: SessionPatch) -> SessionResult<SessionRecord>;

    /// Pure lookup.
    fn get(&self, session_id: &SessionId) -> SessionResult<Option<SessionRecord>>;

    /// Field-wise union of `patch` into the live record, refreshing its expiry.
    ///
    /// Returns the merged record, or `None` if the id is unknown or expired.
    fn merge(&self, session_id: &SessionId, patch: SessionPatch) -> SessionResult<Option<SessionRecord>>;

    /// Idempotent removal.
    fn delete(&self, session_id: &SessionId) -> SessionResult<()>;

    /// Remove every expired record, returning how many were dropped.
    fn purge_expired(&self) -> SessionResult<usize>;

    /// Persist anything buffered. Called once at shutdown.
    fn flush(&self) -> SessionResult<()> {
        Ok(())
    }

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
