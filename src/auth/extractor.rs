// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for cookie sessions (the auth gate).
//!
//! Use `WalletAuth` in handlers that need a linked wallet:
//!
//! ```rust,ignore
//! async fn balances(WalletAuth(session): WalletAuth) -> impl IntoResponse {
//!     // session.wallet_address is present and well-formed
//! }
//! ```
//!
//! The gate is re-evaluated on every request and never writes to the store.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;

use super::AuthError;
use crate::models::{SessionId, SessionRecord, WalletAddress};
use crate::session::{cookie, SessionStore};
use crate::state::AppState;

/// A request carrying a live session (any factor).
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub session_id: SessionId,
    pub record: SessionRecord,
}

/// A request carrying a live session with a well-formed wallet address.
#[derive(Debug, Clone)]
pub struct WalletSession {
    pub session_id: SessionId,
    pub wallet_address: WalletAddress,
    pub record: SessionRecord,
}

/// Resolve the session cookie to a live session.
pub fn authorize(store: &dyn SessionStore, jar: &CookieJar) -> Result<AuthenticatedSession, AuthError> {
    let session_id = cookie::read(jar).ok_or(AuthError::MissingSessionCookie)?;
    let record = store
        .get(&session_id)
        .map_err(|e| AuthError::Store(e.to_string()))?
        .ok_or(AuthError::UnknownSession)?;

    Ok(AuthenticatedSession { session_id, record })
}

/// [`authorize`], additionally requiring a linked wallet.
pub fn authorize_wallet(store: &dyn SessionStore, jar: &CookieJar) -> Result<WalletSession, AuthError> {
    let AuthenticatedSession { session_id, record } = authorize(store, jar)?;
    let wallet_address = record.linked_wallet().cloned().ok_or(AuthError::WalletNotLinked)?;

    Ok(WalletSession {
        session_id,
        wallet_address,
        record,
    })
}

/// Extractor for any authenticated session.
pub struct Auth(pub AuthenticatedSession);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        authorize(state.sessions(), &jar).map(Auth)
    }
}

/// Extractor for wallet-gated endpoints.
pub struct WalletAuth(pub WalletSession);

impl FromRequestParts<AppState> for WalletAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        authorize_wallet(state.sessions(), &jar).map(WalletAuth)
    }
}
