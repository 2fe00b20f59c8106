// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Discord OAuth Module
//!
//! ## Flow
//!
//! 1. `GET /api/auth/discord` mints a state token, sets it in a cookie and
//!    redirects to Discord's authorize endpoint (`scope=identify`)
//! 2. Discord redirects back to `GET /api/auth/callback?code=..&state=..`
//! 3. The server:
//!    - checks the state against the cookie and consumes it
//!    - exchanges the code for an access token (server-to-server)
//!    - fetches `/users/@me`
//!    - links the identity into the browser's session
//! 4. The browser lands on `/` or `/?error=<reason>`
//!
//! ## Security
//!
//! - Outbound calls are bounded by the HTTP client timeout
//! - Failure causes are logged, never shown to the browser

pub mod discord;
pub mod flow;
pub mod state;

pub use discord::{DiscordClient, DiscordConfig, DiscordError};
pub use flow::{CallbackParams, FlowFailure, OAuthFlowController};
pub use state::{OAuthStateRegistry, StateError};
