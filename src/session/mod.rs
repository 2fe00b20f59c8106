// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Module
//!
//! Server-side sessions keyed by an opaque identifier held in an HttpOnly
//! cookie.
//!
//! ## Components
//!
//! - [`SessionStore`]: keyed storage of [`SessionRecord`]s with create, get,
//!   merge and delete. Two backends: [`InMemorySessionStore`] and
//!   [`DurableSessionStore`] (redb).
//! - [`cookie`]: issues, reads and revokes the session cookie.
//! - [`IdentityLinker`]: merge-or-create of a newly authenticated factor.
//! - [`SessionSweeper`]: background purge of expired records.
//!
//! ## Expiry
//!
//! Every record carries `expires_at`. Stores treat an expired record exactly
//! like a missing one; the sweeper only reclaims space.

pub mod cookie;
pub mod durable;
pub mod linker;
pub mod memory;
pub mod store;
pub mod sweeper;

pub use durable::DurableSessionStore;
pub use linker::{IdentityLinker, LinkedSession};
pub use memory::InMemorySessionStore;
pub use store::{session_ttl, SessionError, SessionResult, SessionStore, SESSION_TTL_SECS};
pub use sweeper::SessionSweeper;
