// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Why the auth gate refused a request.
///
/// Every denial renders the same `401 {"error":"Unauthorized"}` so callers
/// can't probe which check failed; the variant is only logged.
#[derive(Debug)]
pub enum AuthError {
    /// No session cookie on the request
    MissingSessionCookie,
    /// Cookie present but the session is unknown, deleted or expired
    UnknownSession,
    /// Session exists but has no well-formed wallet address
    WalletNotLinked,
    /// Session store failure
    Store(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingSessionCookie => "missing_session_cookie",
            AuthError::UnknownSession => "unknown_session",
            AuthError::WalletNotLinked => "wallet_not_linked",
            AuthError::Store(_) => "session_store_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingSessionCookie | AuthError::UnknownSession | AuthError::WalletNotLinked => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingSessionCookie => write!(f, "Session cookie is required"),
            AuthError::UnknownSession => write!(f, "Session is unknown or expired"),
            AuthError::WalletNotLinked => write!(f, "Session has no linked wallet"),
            AuthError::Store(msg) => write!(f, "Session store error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = if status == StatusCode::UNAUTHORIZED {
            tracing::debug!(reason = self.error_code(), "Request denied by auth gate");
            "Unauthorized"
        } else {
            tracing::error!(error = %self, "Auth gate could not reach session store");
            "Internal server error"
        };
        (status, Json(AuthErrorBody { error })).into_response()
    }
}
