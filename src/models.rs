// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Data Models
//!
//! This module defines the session record persisted by the session stores and
//! the request and response shapes used by the auth endpoints. Public JSON is
//! camelCase and derives `ToSchema` for the OpenAPI document.
//!
//! ## Factors
//!
//! A session is built from two independent factors:
//!
//! - **Wallet**: a client-claimed [`WalletAddress`]. Ownership is NOT proven;
//!   the address is trusted as submitted and downstream token endpoints rely
//!   on exactly that contract.
//! - **Discord**: a [`DiscordIdentity`] fetched from Discord after OAuth.
//!
//! A record holding only one factor is a valid, partially authenticated
//! session.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Hex-prefixed wallet address claimed by the browser wallet.
///
/// Only the `0x` prefix is checked. Length and checksum are left to the
/// wallet extension.
///
/// # Example
///
/// ```rust,ignore
/// let addr = WalletAddress::parse("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12")?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct WalletAddress(pub String);

/// Rejection for addresses that are not `0x`-prefixed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid wallet address")]
pub struct InvalidWalletAddress;

impl WalletAddress {
    pub const PREFIX: &'static str = "0x";

    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidWalletAddress> {
        let value = value.into();
        if value.starts_with(Self::PREFIX) {
            Ok(Self(value))
        } else {
            Err(InvalidWalletAddress)
        }
    }

    /// Whether the stored value still satisfies the claim rules.
    pub fn is_well_formed(&self) -> bool {
        self.0.starts_with(Self::PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Discord Identity
// =============================================================================

/// Discord profile fields linked into a session.
///
/// Deserializes directly from the `GET /users/@me` payload; unknown fields are
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscordIdentity {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

// =============================================================================
// Session Record
// =============================================================================

/// Opaque, unguessable session identifier carried in the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Allocate a fresh random identifier (v4 UUID).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix that is safe to put in logs.
    pub fn redacted(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partial factor data applied on create or merge.
///
/// `None` means "leave as is". The Discord fields travel as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub wallet_address: Option<WalletAddress>,
    pub discord: Option<DiscordIdentity>,
}

impl SessionPatch {
    pub fn wallet(address: WalletAddress) -> Self {
        Self {
            wallet_address: Some(address),
            discord: None,
        }
    }

    pub fn discord(identity: DiscordIdentity) -> Self {
        Self {
            wallet_address: None,
            discord: Some(identity),
        }
    }
}

/// The persisted session entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: SessionId,
    #[serde(default)]
    pub wallet_address: Option<WalletAddress>,
    #[serde(default)]
    pub discord: Option<DiscordIdentity>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(session_id: SessionId, patch: SessionPatch, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            session_id,
            wallet_address: patch.wallet_address,
            discord: patch.discord,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Field-wise union: fields present in `patch` win, the rest are kept.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(address) = patch.wallet_address {
            self.wallet_address = Some(address);
        }
        if let Some(identity) = patch.discord {
            self.discord = Some(identity);
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Wallet-gated endpoints accept only sessions with a well-formed address.
    pub fn linked_wallet(&self) -> Option<&WalletAddress> {
        self.wallet_address
            .as_ref()
            .filter(|address| address.is_well_formed())
    }

    pub fn to_user(&self) -> SessionUser {
        SessionUser {
            wallet_address: self.wallet_address.as_ref().map(|a| a.0.clone()),
            discord_id: self.discord.as_ref().map(|d| d.id.clone()),
            discord_username: self.discord.as_ref().map(|d| d.username.clone()),
            discord_avatar: self.discord.as_ref().and_then(|d| d.avatar.clone()),
        }
    }
}

// =============================================================================
// Auth API Models
// =============================================================================

/// Browser-facing view of a session. Never includes the session id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Claimed wallet address (`0x`-prefixed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    /// Discord user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_id: Option<String>,
    /// Discord username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_username: Option<String>,
    /// Discord avatar hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_avatar: Option<String>,
}

/// Request body for `POST /api/auth/wallet`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletClaimRequest {
    /// Address reported by the wallet extension.
    #[serde(default)]
    pub wallet_address: Option<String>,
}

/// `{ "user": SessionUser }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user: SessionUser,
}

/// `{ "user": SessionUser | null }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user: Option<SessionUser>,
}

/// `{ "success": true }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
}
