// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints: wallet claim, session read, logout and the two Discord
//! redirect legs.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;

use crate::{
    auth::{Auth, AuthError},
    error::ApiError,
    models::{
        InvalidWalletAddress, LogoutResponse, MeResponse, SessionPatch, UserResponse, WalletAddress,
        WalletClaimRequest,
    },
    oauth::{
        flow::{FlowFailure, REASON_AUTH_FAILED},
        state::{clear_state_cookie, read_state_cookie, state_cookie},
        CallbackParams,
    },
    session::{cookie, IdentityLinker},
    state::AppState,
};

/// 302 Found with the given `Location`, carrying any cookie changes.
fn found(jar: CookieJar, location: &str) -> Response {
    (StatusCode::FOUND, jar, [(header::LOCATION, location.to_string())]).into_response()
}

/// Record a wallet address in the browser's session.
#[utoipa::path(
    post,
    path = "/api/auth/wallet",
    request_body = WalletClaimRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Wallet linked, session cookie set", body = UserResponse),
        (status = 400, description = "Invalid wallet address or body")
    )
)]
pub async fn claim_wallet(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<WalletClaimRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    let Json(request) = body?;
    let wallet = request
        .wallet_address
        .ok_or(InvalidWalletAddress)
        .and_then(|raw| WalletAddress::parse(raw))
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let current = cookie::read(&jar);
    let linked = IdentityLinker::new(state.sessions()).link(current.as_ref(), SessionPatch::wallet(wallet))?;
    tracing::info!(
        session = %linked.record.session_id.redacted(),
        created = linked.created,
        "Wallet claimed"
    );

    let user = linked.record.to_user();
    Ok((jar.add(linked.cookie), Json(UserResponse { user })))
}

/// Return the current session's user view.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Live session", body = MeResponse),
        (status = 401, description = "No live session, body is `{\"user\":null}`", body = MeResponse)
    )
)]
pub async fn me(auth: Result<Auth, AuthError>) -> Response {
    match auth {
        Ok(Auth(session)) => Json(MeResponse {
            user: Some(session.record.to_user()),
        })
        .into_response(),
        Err(err @ AuthError::Store(_)) => err.into_response(),
        Err(_) => (StatusCode::UNAUTHORIZED, Json(MeResponse { user: None })).into_response(),
    }
}

/// Delete the session (if any) and expire the cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logged out", body = LogoutResponse))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    if let Some(session_id) = cookie::read(&jar) {
        // Logout always succeeds for the browser; a failed delete leaves the
        // record to expire on its own.
        match state.sessions().delete(&session_id) {
            Ok(()) => tracing::info!(session = %session_id.redacted(), "Session logged out"),
            Err(e) => tracing::error!(session = %session_id.redacted(), error = %e, "Failed to delete session"),
        }
    }

    (jar.add(cookie::revoke()), Json(LogoutResponse { success: true }))
}

/// Start the Discord authorization-code flow.
#[utoipa::path(
    get,
    path = "/api/auth/discord",
    tag = "Auth",
    responses((status = 302, description = "Redirect to Discord's authorize page"))
)]
pub async fn discord_start(State(state): State<AppState>, jar: CookieJar) -> Response {
    match state.oauth_flow().start() {
        Ok(start) => found(jar.add(state_cookie(&start.state)), start.url.as_str()),
        Err(e) => {
            tracing::error!(error = %e, "Could not mint OAuth state");
            found(jar, &format!("/?error={REASON_AUTH_FAILED}"))
        }
    }
}

/// Discord redirect target.
///
/// Always answers with a redirect: `/` on success, `/?error=<reason>` otherwise.
#[utoipa::path(
    get,
    path = "/api/auth/callback",
    tag = "Auth",
    params(CallbackParams),
    responses((status = 302, description = "Redirect to `/` or `/?error=no_code|discord_auth_failed`"))
)]
pub async fn discord_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let state_token = read_state_cookie(&jar);
    let current = cookie::read(&jar);
    let jar = jar.add(clear_state_cookie());

    match state
        .oauth_flow()
        .complete(params, state_token.as_deref(), current.as_ref())
        .await
    {
        Ok(linked) => found(jar.add(linked.cookie), "/"),
        Err(failure) => {
            match &failure {
                FlowFailure::MissingAuthorizationCode => {
                    tracing::info!(reason = failure.reason(), "Discord callback rejected")
                }
                FlowFailure::SessionStore(_) => {
                    tracing::error!(reason = failure.reason(), error = %failure, "Discord callback failed")
                }
                _ => tracing::warn!(
                    reason = failure.reason(),
                    timeout = failure.is_timeout(),
                    error = %failure,
                    "Discord callback failed"
                ),
            }
            found(jar, &failure.redirect_location())
        }
    }
}
