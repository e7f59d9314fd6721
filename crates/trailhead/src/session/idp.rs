// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity-provider boundary.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::AuthError;

/// Opaque handle identifying the signed-in entity to the identity provider,
/// used for follow-up calls (attribute lookup, renewal) distinct from the
/// credential itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
}

/// A raw session as issued by the identity provider.
#[derive(Debug, Clone)]
pub struct IdpSession {
    pub principal: Principal,
    /// The signed credential proving the principal's identity downstream.
    pub credential: String,
}

/// Attribute mapping from the provider's user-attribute endpoint.
pub type UserAttributes = HashMap<String, String>;

/// The managed identity provider, as consumed by the session manager.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate with identifier + secret and issue a session.
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<IdpSession, AuthError>;

    /// Invalidate the provider's locally stored session state.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The current session, refreshing the provider's underlying token when
    /// the stored credential is stale. `None` when no valid session exists.
    async fn current_session(&self) -> Result<Option<IdpSession>, AuthError>;

    /// Look up user attributes for display-name fallback resolution.
    async fn user_attributes(&self, principal: &Principal) -> Result<UserAttributes, AuthError>;

    /// Register a new account. The account stays unusable until confirmed.
    async fn sign_up(
        &self,
        identifier: &str,
        secret: &str,
        name: Option<&str>,
    ) -> Result<(), AuthError>;

    /// Confirm a registration with the emailed code.
    async fn confirm_sign_up(&self, identifier: &str, code: &str) -> Result<(), AuthError>;

    /// Resend the confirmation code.
    async fn resend_confirmation(&self, identifier: &str) -> Result<(), AuthError>;
}
