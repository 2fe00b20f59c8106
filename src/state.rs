// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::oauth::{DiscordClient, OAuthFlowController, OAuthStateRegistry};
use crate::session::SessionStore;

/// Shared handler state. The session store is injected so the backend can be
/// swapped without touching handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub discord: Arc<DiscordClient>,
    pub oauth_states: Arc<OAuthStateRegistry>,
}

impl AppState {
    pub fn new(sessions: Arc<dyn SessionStore>, discord: DiscordClient) -> Self {
        Self {
            sessions,
            discord: Arc::new(discord),
            oauth_states: Arc::new(OAuthStateRegistry::new()),
        }
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    pub fn oauth_flow(&self) -> OAuthFlowController<'_> {
        OAuthFlowController::new(&self.discord, &self.oauth_states, self.sessions.as_ref())
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use crate::oauth::DiscordConfig;
    use crate::session::InMemorySessionStore;

    // Nothing listens on port 1, so outbound Discord calls fail fast.
    let base: url::Url = "http://127.0.0.1:1/api/".parse().unwrap();
    let config = DiscordConfig::new("client", "secret", "http://localhost:8080/api/auth/callback".parse().unwrap())
        .with_api_base(&base)
        .unwrap()
        .with_timeout(std::time::Duration::from_secs(2));
    AppState::new(
        Arc::new(InMemorySessionStore::new()),
        DiscordClient::new(config).unwrap(),
    )
}
