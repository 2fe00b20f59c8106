// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Athena Server - Wallet + Discord Session Service
//!
//! Authenticates a browser user through a claimed wallet address and/or a
//! Discord OAuth identity, links both factors into one server-side session
//! keyed by an HttpOnly cookie, and gates the token endpoints on a session
//! with a linked wallet.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and the OpenAPI document
//! - `auth` - Auth gate extractors for protected endpoints
//! - `oauth` - Discord authorization-code flow
//! - `server` - Listener and graceful shutdown
//! - `session` - Session store backends, cookie codec and identity linking

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod oauth;
pub mod server;
pub mod session;
pub mod state;
