// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Anti-forgery `state` tokens for the OAuth redirect.
//!
//! A token is minted when the browser starts the flow, stored server-side and
//! in a short-lived cookie scoped to the auth routes. The callback must present
//! the same token in the query and the cookie, and the server-side entry is
//! consumed on first use, so a callback can neither be forged cross-site nor
//! replayed.

use std::collections::HashMap;
use std::sync::Mutex;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};

use crate::crypto::{random_token, RandomUnavailable};

pub const STATE_COOKIE_NAME: &str = "athena_oauth_state";
pub const STATE_COOKIE_PATH: &str = "/api/auth";
pub const STATE_TTL_SECS: i64 = 600;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Random(#[from] RandomUnavailable),

    #[error("state registry lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
pub struct OAuthStateRegistry {
    pending: Mutex<HashMap<String, DateTime<Utc>>>,
    ttl: Duration,
}

impl Default for OAuthStateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OAuthStateRegistry {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(STATE_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Mint and register a new state token.
    pub fn issue(&self) -> Result<String, StateError> {
        let token = random_token()?;
        let now = Utc::now();
        let mut pending = self.pending.lock().map_err(|_| StateError::Poisoned)?;
        pending.retain(|_, expires_at| *expires_at > now);
        pending.insert(token.clone(), now + self.ttl);
        Ok(token)
    }

    /// Single-use check: `true` only for a registered, unexpired token.
    pub fn consume(&self, token: &str) -> bool {
        let Ok(mut pending) = self.pending.lock() else {
            return false;
        };
        match pending.remove(token) {
            Some(expires_at) => expires_at > Utc::now(),
            None => false,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

/// Cookie binding the state token to the browser that started the flow.
pub fn state_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, token.to_string()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path(STATE_COOKIE_PATH)
        .max_age(time::Duration::seconds(STATE_TTL_SECS))
        .build()
}

pub fn clear_state_cookie() -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, ""))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path(STATE_COOKIE_PATH)
        .max_age(time::Duration::ZERO)
        .build()
}

pub fn read_state_cookie(jar: &CookieJar) -> Option<String> {
    jar.get(STATE_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|value| !value.is_empty())
}
