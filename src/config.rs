// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SESSION_BACKEND` | Session store (`memory` or `redb`) | `memory` |
//! | `DATA_DIR` | Directory for the redb session file | `./data` |
//! | `SESSION_SWEEP_INTERVAL_SECS` | Expired-session purge interval | `300` |
//! | `DISCORD_CLIENT_ID` | Discord application id | Required |
//! | `DISCORD_CLIENT_SECRET` | Discord application secret | Required |
//! | `DISCORD_REDIRECT_URI` | Registered OAuth redirect URI | `http://localhost:5173/api/auth/callback` |
//! | `DISCORD_AUTHORIZE_URL` | Authorize endpoint | `https://discord.com/api/oauth2/authorize` |
//! | `DISCORD_TOKEN_URL` | Token endpoint | `https://discord.com/api/oauth2/token` |
//! | `DISCORD_USER_URL` | Current-user endpoint | `https://discord.com/api/users/@me` |
//! | `OAUTH_HTTP_TIMEOUT_SECS` | Timeout for calls to Discord | `10` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; HTTPS when both are set | Unset (HTTP) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::oauth::discord::{self, DiscordConfig};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const SESSION_BACKEND_ENV: &str = "SESSION_BACKEND";

/// Environment variable name for the data directory path.
///
/// Only read when `SESSION_BACKEND=redb`; the session database lives at
/// `$DATA_DIR/sessions.redb`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const SESSION_SWEEP_INTERVAL_ENV: &str = "SESSION_SWEEP_INTERVAL_SECS";
pub const DISCORD_CLIENT_ID_ENV: &str = "DISCORD_CLIENT_ID";
pub const DISCORD_CLIENT_SECRET_ENV: &str = "DISCORD_CLIENT_SECRET";
pub const DISCORD_REDIRECT_URI_ENV: &str = "DISCORD_REDIRECT_URI";
pub const DISCORD_AUTHORIZE_URL_ENV: &str = "DISCORD_AUTHORIZE_URL";
pub const DISCORD_TOKEN_URL_ENV: &str = "DISCORD_TOKEN_URL";
pub const DISCORD_USER_URL_ENV: &str = "DISCORD_USER_URL";
pub const OAUTH_HTTP_TIMEOUT_ENV: &str = "OAUTH_HTTP_TIMEOUT_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Where sessions are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Redb { data_dir: PathBuf },
}

/// PEM certificate chain and private key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub session_backend: SessionBackend,
    pub sweep_interval: Duration,
    pub discord: DiscordConfig,
    pub tls: Option<TlsPaths>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match var(PORT_ENV) {
            Some(raw) => parse_number::<u16>(PORT_ENV, &raw)?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = format!("{host}:{port}").parse().map_err(|e| ConfigError::Invalid {
            var: HOST_ENV,
            reason: format!("{e}"),
        })?;

        let session_backend = match var(SESSION_BACKEND_ENV).as_deref().map(str::to_ascii_lowercase) {
            None => SessionBackend::Memory,
            Some(name) if name == "memory" => SessionBackend::Memory,
            Some(name) if name == "redb" => SessionBackend::Redb {
                data_dir: PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: SESSION_BACKEND_ENV,
                    reason: format!("unknown backend `{other}` (expected memory or redb)"),
                })
            }
        };

        let sweep_interval = Duration::from_secs(match var(SESSION_SWEEP_INTERVAL_ENV) {
            Some(raw) => positive_secs(SESSION_SWEEP_INTERVAL_ENV, &raw)?,
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        });

        let client_id = var(DISCORD_CLIENT_ID_ENV).ok_or(ConfigError::Missing(DISCORD_CLIENT_ID_ENV))?;
        let client_secret =
            var(DISCORD_CLIENT_SECRET_ENV).ok_or(ConfigError::Missing(DISCORD_CLIENT_SECRET_ENV))?;
        let redirect_uri = parse_url(
            DISCORD_REDIRECT_URI_ENV,
            &var(DISCORD_REDIRECT_URI_ENV).unwrap_or_else(|| discord::DEFAULT_REDIRECT_URI.to_string()),
        )?;

        let mut discord = DiscordConfig::new(client_id, client_secret, redirect_uri);
        if let Some(raw) = var(DISCORD_AUTHORIZE_URL_ENV) {
            discord.authorize_url = parse_url(DISCORD_AUTHORIZE_URL_ENV, &raw)?;
        }
        if let Some(raw) = var(DISCORD_TOKEN_URL_ENV) {
            discord.token_url = parse_url(DISCORD_TOKEN_URL_ENV, &raw)?;
        }
        if let Some(raw) = var(DISCORD_USER_URL_ENV) {
            discord.user_url = parse_url(DISCORD_USER_URL_ENV, &raw)?;
        }
        if let Some(raw) = var(OAUTH_HTTP_TIMEOUT_ENV) {
            discord = discord.with_timeout(Duration::from_secs(positive_secs(OAUTH_HTTP_TIMEOUT_ENV, &raw)?));
        }

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        Ok(Self {
            bind_addr,
            session_backend,
            sweep_interval,
            discord,
            tls,
        })
    }
}

/// `true` when `LOG_FORMAT=json`.
pub fn json_logs() -> bool {
    std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn positive_secs(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match parse_number::<u64>(var, raw)? {
        0 => Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".to_string(),
        }),
        secs => Ok(secs),
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}
