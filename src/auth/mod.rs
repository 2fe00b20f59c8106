// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Auth Gate
//!
//! Read-only guard consulted by protected endpoints.
//!
//! ## Checks
//!
//! 1. Session cookie present, else 401
//! 2. Cookie resolves to a live (unexpired) session, else 401
//! 3. For wallet-gated endpoints, the session holds a `0x`-prefixed wallet
//!    address, else 401
//!
//! The gate never mutates session state and nothing is cached between
//! requests.
//!
//! ## Trust boundary
//!
//! The wallet address is whatever the browser claimed. No signature challenge
//! proves ownership; token endpoints must treat it as an unverified claim.

pub mod error;
pub mod extractor;

pub use error::AuthError;
pub use extractor::{authorize, authorize_wallet, Auth, AuthenticatedSession, WalletAuth, WalletSession};
