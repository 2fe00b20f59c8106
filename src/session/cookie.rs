// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session cookie codec.
//!
//! The cookie carries only the session id. Whether that id still resolves to
//! a live session is decided by the session store, never here.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use super::store::SESSION_TTL_SECS;
use crate::models::SessionId;

pub const SESSION_COOKIE_NAME: &str = "athena_session";

/// Build the session cookie: `Path=/; HttpOnly; SameSite=Lax; Secure; Max-Age=604800`.
pub fn issue(session_id: &SessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id.as_str().to_string()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(SESSION_TTL_SECS))
        .build()
}

/// Session id presented by the browser, if any.
pub fn read(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE_NAME)
        .map(|c| c.value())
        .filter(|value| !value.is_empty())
        .map(SessionId::from)
}

/// Removal cookie that clears the session cookie at `Path=/`.
pub fn revoke() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}
