// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Discord OAuth2 client (authorization-code grant).

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::models::DiscordIdentity;

pub const DEFAULT_AUTHORIZE_URL: &str = "https://discord.com/api/oauth2/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
pub const DEFAULT_USER_URL: &str = "https://discord.com/api/users/@me";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173/api/auth/callback";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Only the profile is needed.
pub const DISCORD_SCOPE: &str = "identify";

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },

    #[error("{endpoint} response was invalid: {source}")]
    InvalidResponse {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl DiscordError {
    pub fn is_timeout(&self) -> bool {
        match self {
            DiscordError::Request { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Discord application settings.
#[derive(Clone)]
pub struct DiscordConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Url,
    pub authorize_url: Url,
    pub token_url: Url,
    pub user_url: Url,
    pub timeout: Duration,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("authorize_url", &self.authorize_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("user_url", &self.user_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DiscordConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>, redirect_uri: Url) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
            authorize_url: DEFAULT_AUTHORIZE_URL.parse().expect("valid default URL"),
            token_url: DEFAULT_TOKEN_URL.parse().expect("valid default URL"),
            user_url: DEFAULT_USER_URL.parse().expect("valid default URL"),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Point all three Discord endpoints at `base` (`{base}/oauth2/authorize`,
    /// `{base}/oauth2/token`, `{base}/users/@me`).
    pub fn with_api_base(mut self, base: &Url) -> Result<Self, url::ParseError> {
        self.authorize_url = base.join("oauth2/authorize")?;
        self.token_url = base.join("oauth2/token")?;
        self.user_url = base.join("users/@me")?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

pub struct DiscordClient {
    config: DiscordConfig,
    http: Client,
}

impl DiscordClient {
    pub fn new(config: DiscordConfig) -> Result<Self, DiscordError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DiscordError::Client(e.to_string()))?;
        Ok(Self { config, http })
    }

    /// Authorize URL for the browser redirect, carrying the anti-forgery `state`.
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", DISCORD_SCOPE)
            .append_pair("state", state);
        url
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, DiscordError> {
        const ENDPOINT: &str = "token endpoint";

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|source| DiscordError::Request { endpoint: ENDPOINT, source })?;

        if !response.status().is_success() {
            return Err(DiscordError::Status {
                endpoint: ENDPOINT,
                status: response.status(),
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|source| DiscordError::InvalidResponse { endpoint: ENDPOINT, source })
    }

    /// Fetch the profile of the token's owner.
    pub async fn fetch_user(&self, access_token: &str) -> Result<DiscordIdentity, DiscordError> {
        const ENDPOINT: &str = "user endpoint";

        let response = self
            .http
            .get(self.config.user_url.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|source| DiscordError::Request { endpoint: ENDPOINT, source })?;

        if !response.status().is_success() {
            return Err(DiscordError::Status {
                endpoint: ENDPOINT,
                status: response.status(),
            });
        }

        response
            .json::<DiscordIdentity>()
            .await
            .map_err(|source| DiscordError::InvalidResponse { endpoint: ENDPOINT, source })
    }
}
