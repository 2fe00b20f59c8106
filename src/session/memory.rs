// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process session store.
//!
//! Records live in a `HashMap` behind a `RwLock`. Merges take the write lock
//! for the whole read-modify-write, so concurrent merges on one id serialize.
//! Nothing survives a restart; use [`super::DurableSessionStore`] for that.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Duration, Utc};

use super::store::{session_ttl, SessionError, SessionResult, SessionStore};
use crate::models::{SessionId, SessionPatch, SessionRecord};

#[derive(Debug)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
    ttl: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_ttl(session_ttl())
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of records held, expired ones included.
    pub fn len(&self) -> usize {
        self.read().map(|sessions| sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> SessionResult<RwLockReadGuard<'_, HashMap<SessionId, SessionRecord>>> {
        self.sessions.read().map_err(|_| SessionError::Poisoned)
    }

    fn write(&self) -> SessionResult<RwLockWriteGuard<'_, HashMap<SessionId, SessionRecord>>> {
        self.sessions.write().map_err(|_| SessionError::Poisoned)
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, initial: SessionPatch) -> SessionResult<SessionRecord> {
        let mut sessions = self.write()?;
        let now = Utc::now();

        let mut session_id = SessionId::generate();
        while sessions.contains_key(&session_id) {
            session_id = SessionId::generate();
        }

        let record = SessionRecord::new(session_id.clone(), initial, now, self.ttl);
        sessions.insert(session_id, record.clone());
        Ok(record)
    }

    fn get(&self, session_id: &SessionId) -> SessionResult<Option<SessionRecord>> {
        let now = Utc::now();
        Ok(self
            .read()?
            .get(session_id)
            .filter(|record| !record.is_expired_at(now))
            .cloned())
    }

    fn merge(&self, session_id: &SessionId, patch: SessionPatch) -> SessionResult<Option<SessionRecord>> {
        let mut sessions = self.write()?;
        let now = Utc::now();

        let Some(record) = sessions.get_mut(session_id) else {
            return Ok(None);
        };
        if record.is_expired_at(now) {
            sessions.remove(session_id);
            return Ok(None);
        }

        record.apply(patch);
        record.expires_at = now + self.ttl;
        Ok(Some(record.clone()))
    }

    fn delete(&self, session_id: &SessionId) -> SessionResult<()> {
        self.write()?.remove(session_id);
        Ok(())
    }

    fn purge_expired(&self) -> SessionResult<usize> {
        let mut sessions = self.write()?;
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired_at(now));
        Ok(before - sessions.len())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
