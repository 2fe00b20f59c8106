// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity linking (merge-or-create).
//!
//! A factor that authenticates while the browser already holds a live session
//! is merged into that session; otherwise a new session is created. Either
//! way a fresh session cookie is returned, so a browser that arrived without
//! one leaves with one.

use axum_extra::extract::cookie::Cookie;

use super::cookie;
use super::store::{SessionResult, SessionStore};
use crate::models::{SessionId, SessionPatch, SessionRecord};

/// Result of linking a factor.
#[derive(Debug)]
pub struct LinkedSession {
    pub record: SessionRecord,
    /// `true` when no live session was presented and a new one was allocated.
    pub created: bool,
    pub cookie: Cookie<'static>,
}

pub struct IdentityLinker<'a> {
    store: &'a dyn SessionStore,
}

impl<'a> IdentityLinker<'a> {
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Self { store }
    }

    /// Merge `factor` into the presented session, or create one.
    ///
    /// The merge itself is the existence check, so a session deleted or
    /// expired between cookie read and merge falls through to create.
    pub fn link(&self, current: Option<&SessionId>, factor: SessionPatch) -> SessionResult<LinkedSession> {
        if let Some(session_id) = current {
            if let Some(record) = self.store.merge(session_id, factor.clone())? {
                tracing::debug!(session = %session_id.redacted(), "Linked factor into existing session");
                return Ok(LinkedSession {
                    cookie: cookie::issue(&record.session_id),
                    record,
                    created: false,
                });
            }
        }

        let record = self.store.create(factor)?;
        tracing::debug!(session = %record.session_id.redacted(), "Created session for new factor");
        Ok(LinkedSession {
            cookie: cookie::issue(&record.session_id),
            record,
            created: true,
        })
    }
}
