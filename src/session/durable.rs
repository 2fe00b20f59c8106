// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable session store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `sessions`: session_id → serialized [`SessionRecord`] (JSON bytes)
//!
//! Every mutating call runs in its own write transaction. redb admits one
//! writer at a time, which makes `merge` atomic per key without extra locks.
//! Commits use redb's default immediate durability, so there is nothing left
//! to flush at shutdown.

use std::path::Path;

use chrono::{Duration, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::store::{session_ttl, SessionResult, SessionStore};
use crate::models::{SessionId, SessionPatch, SessionRecord};

/// Primary table: session_id → serialized SessionRecord.
const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// File name of the session database inside the data directory.
pub const SESSION_DB_FILE: &str = "sessions.redb";

pub struct DurableSessionStore {
    db: Database,
    ttl: Duration,
}

impl DurableSessionStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> SessionResult<Self> {
        Self::open_with_ttl(path, session_ttl())
    }

    pub fn open_with_ttl(path: &Path, ttl: Duration) -> SessionResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SESSIONS)?;
        }
        write_txn.commit()?;

        Ok(Self { db, ttl })
    }
}

impl SessionStore for DurableSessionStore {
    fn create(&self, initial: SessionPatch) -> SessionResult<SessionRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(SESSIONS)?;

            let mut session_id = SessionId::generate();
            while table.get(session_id.as_str())?.is_some() {
                session_id = SessionId::generate();
            }

            let record = SessionRecord::new(session_id, initial, Utc::now(), self.ttl);
            let json = serde_json::to_vec(&record)?;
            table.insert(record.session_id.as_str(), json.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    fn get(&self, session_id: &SessionId) -> SessionResult<Option<SessionRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;
        let record = match table.get(session_id.as_str())? {
            Some(value) => serde_json::from_slice::<SessionRecord>(value.value())?,
            None => return Ok(None),
        };

        if record.is_expired_at(Utc::now()) {
            Ok(None)
        } else {
            Ok(Some(record))
        }
    }

    fn merge(&self, session_id: &SessionId, patch: SessionPatch) -> SessionResult<Option<SessionRecord>> {
        let now = Utc::now();
        let write_txn = self.db.begin_write()?;
        let merged = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let existing = match table.get(session_id.as_str())? {
                Some(value) => Some(serde_json::from_slice::<SessionRecord>(value.value())?),
                None => None,
            };

            match existing {
                None => None,
                Some(record) if record.is_expired_at(now) => {
                    table.remove(session_id.as_str())?;
                    None
                }
                Some(mut record) => {
                    record.apply(patch);
                    record.expires_at = now + self.ttl;
                    let json = serde_json::to_vec(&record)?;
                    table.insert(session_id.as_str(), json.as_slice())?;
                    Some(record)
                }
            }
        };
        write_txn.commit()?;
        Ok(merged)
    }

    fn delete(&self, session_id: &SessionId) -> SessionResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            table.remove(session_id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn purge_expired(&self) -> SessionResult<usize> {
        let now = Utc::now();
        let write_txn = self.db.begin_write()?;
        let purged = {
            let mut table = write_txn.open_table(SESSIONS)?;

            let mut expired = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                match serde_json::from_slice::<SessionRecord>(value.value()) {
                    Ok(record) if !record.is_expired_at(now) => {}
                    Ok(_) => expired.push(key.value().to_string()),
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping undecodable session record");
                        expired.push(key.value().to_string());
                    }
                }
            }

            for key in &expired {
                table.remove(key.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;
        Ok(purged)
    }

    fn backend(&self) -> &'static str {
        "redb"
    }
}
