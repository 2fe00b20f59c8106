// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Discord authorization-code flow.
//!
//! ```text
//! Start ──302──▶ Discord ──302──▶ CallbackReceived ─▶ TokenExchanged ─▶ UserFetched ─▶ SessionMerged ─▶ Done
//!                                      │                   │                 │               │
//!                                      └───────────────────┴─────────────────┴───────────────┴──▶ Failed(reason)
//! ```
//!
//! Each step returns a `Result`; the first failure ends the flow as a
//! [`FlowFailure`]. The HTTP layer turns the outcome into exactly one
//! redirect. No step before `SessionMerged` touches the session store.

use serde::Deserialize;
use url::Url;
use utoipa::IntoParams;

use super::discord::{DiscordClient, DiscordError};
use super::state::{OAuthStateRegistry, StateError};
use crate::models::{SessionId, SessionPatch};
use crate::session::{IdentityLinker, LinkedSession, SessionError, SessionStore};

/// Public reason tag for a callback that arrived without a code.
pub const REASON_NO_CODE: &str = "no_code";
/// Public reason tag for every other callback failure.
pub const REASON_AUTH_FAILED: &str = "discord_auth_failed";

/// Query parameters Discord appends to the redirect URI.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    /// Authorization code (absent when the user denied access).
    pub code: Option<String>,
    /// Anti-forgery token echoed from the authorize request.
    pub state: Option<String>,
    /// Provider error, e.g. `access_denied`.
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FlowFailure {
    #[error("authorization code missing from callback")]
    MissingAuthorizationCode,

    #[error("state missing, mismatched or already used")]
    StateMismatch,

    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(#[source] DiscordError),

    #[error("profile fetch failed: {0}")]
    ProfileFetchFailed(#[source] DiscordError),

    #[error("session store failed: {0}")]
    SessionStore(#[from] SessionError),
}

impl FlowFailure {
    /// Coarse tag shown to the browser. Causes are only logged.
    pub fn reason(&self) -> &'static str {
        match self {
            FlowFailure::MissingAuthorizationCode => REASON_NO_CODE,
            FlowFailure::StateMismatch
            | FlowFailure::TokenExchangeFailed(_)
            | FlowFailure::ProfileFetchFailed(_)
            | FlowFailure::SessionStore(_) => REASON_AUTH_FAILED,
        }
    }

    /// Whether an outbound Discord call ran out of time.
    pub fn is_timeout(&self) -> bool {
        match self {
            FlowFailure::TokenExchangeFailed(e) | FlowFailure::ProfileFetchFailed(e) => e.is_timeout(),
            _ => false,
        }
    }

    pub fn redirect_location(&self) -> String {
        format!("/?error={}", self.reason())
    }
}

/// Redirect target plus the state token to bind in a cookie.
#[derive(Debug)]
pub struct AuthorizationStart {
    pub url: Url,
    pub state: String,
}

pub struct OAuthFlowController<'a> {
    discord: &'a DiscordClient,
    states: &'a OAuthStateRegistry,
    store: &'a dyn SessionStore,
}

impl<'a> OAuthFlowController<'a> {
    pub fn new(discord: &'a DiscordClient, states: &'a OAuthStateRegistry, store: &'a dyn SessionStore) -> Self {
        Self {
            discord,
            states,
            store,
        }
    }

    /// Start: mint a state token and build the authorize URL.
    pub fn start(&self) -> Result<AuthorizationStart, StateError> {
        let state = self.states.issue()?;
        Ok(AuthorizationStart {
            url: self.discord.authorization_url(&state),
            state,
        })
    }

    /// Drive the callback to a terminal outcome.
    ///
    /// `state_cookie` is the token the browser holds; `current` is the
    /// session id from the session cookie, if any.
    pub async fn complete(
        &self,
        params: CallbackParams,
        state_cookie: Option<&str>,
        current: Option<&SessionId>,
    ) -> Result<LinkedSession, FlowFailure> {
        // CallbackReceived
        let Some(code) = params.code.filter(|code| !code.is_empty()) else {
            if let Some(error) = &params.error {
                tracing::info!(provider_error = %error, "Discord callback without code");
            }
            return Err(FlowFailure::MissingAuthorizationCode);
        };
        self.verify_state(params.state.as_deref(), state_cookie)?;

        // TokenExchanged
        let token = self
            .discord
            .exchange_code(&code)
            .await
            .map_err(FlowFailure::TokenExchangeFailed)?;

        // UserFetched
        let identity = self
            .discord
            .fetch_user(&token.access_token)
            .await
            .map_err(FlowFailure::ProfileFetchFailed)?;

        // SessionMerged
        let discord_id = identity.id.clone();
        let linked = IdentityLinker::new(self.store).link(current, SessionPatch::discord(identity))?;
        tracing::info!(
            discord_id = %discord_id,
            session = %linked.record.session_id.redacted(),
            created = linked.created,
            "Discord identity linked"
        );
        Ok(linked)
    }

    fn verify_state(&self, query_state: Option<&str>, cookie_state: Option<&str>) -> Result<(), FlowFailure> {
        match (query_state, cookie_state) {
            (Some(query), Some(cookie)) if query == cookie && self.states.consume(query) => Ok(()),
            _ => Err(FlowFailure::StateMismatch),
        }
    }
}
