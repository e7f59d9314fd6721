// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle: establishing, renewing, and tearing down the
//! authenticated identity-provider session.
//!
//! The manager owns the single authoritative session; the binding exposes
//! the current credential to outbound domain calls; the claims module
//! decodes the credential payload. The identity provider itself sits behind
//! the [`idp::IdentityProvider`] trait.

pub mod binding;
pub mod claims;
pub mod idp;
pub mod manager;
pub mod oidc;

use serde::{Deserialize, Serialize};

use crate::session::claims::Claims;
use crate::session::idp::Principal;

/// Fallback display name when no claim, attribute, or identifier is usable.
pub const FALLBACK_DISPLAY_NAME: &str = "Traveler";

/// The authoritative in-memory session record.
///
/// Replaced wholesale on every renewal, never mutated field by field.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque signed credential attached to outbound domain calls.
    pub credential: String,
    /// Claims decoded from the credential.
    pub claims: Claims,
    /// Identity-provider handle for follow-up calls.
    pub principal: Principal,
    /// Resolved once per application; see the display-name priority chain.
    pub display_name: String,
}

/// Externally observable lifecycle state.
#[derive(Debug, Clone)]
pub enum LifecycleState {
    /// Initial resolution against the identity provider is still in flight.
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

/// Snapshot served to the route guard and views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSnapshot {
    pub loading: bool,
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Why a session was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearReason {
    SignedOut,
    /// Renewal or initial load found no valid session.
    SessionLost,
}

/// Events emitted by the session manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session was applied (sign-in, initial load, or renewal).
    Established {
        display_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expires_at: Option<u64>,
    },
    /// The session was cleared.
    Cleared { reason: ClearReason },
}

/// Current epoch seconds.
pub(crate) fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
