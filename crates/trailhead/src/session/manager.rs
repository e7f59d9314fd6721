// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle manager: owns the authoritative session state, arms
//! exactly one pending renewal, and applies identity-provider results.
//!
//! All lifecycle state lives behind one synchronous lock; commits are
//! lock-held critical sections with no await inside, so the token binding
//! is never observed out of step with the last-completed transition.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::error::AuthError;
use crate::session::binding::TokenBinding;
use crate::session::claims::Claims;
use crate::session::idp::{IdentityProvider, IdpSession, Principal};
use crate::session::{
    epoch_secs, AuthSnapshot, ClearReason, LifecycleState, Session, SessionEvent,
    FALLBACK_DISPLAY_NAME,
};

/// Renew this long before the credential expires.
const RENEW_LEAD_SECS: u64 = 60;

/// Assumed credential lifetime when the claims carry no expiry.
const DEFAULT_LIFETIME_SECS: u64 = 600;

/// Floor for the renewal delay, so an imminently expiring or already
/// expired credential does not cause a renewal storm.
const MIN_RENEW_DELAY_SECS: u64 = 5;

struct Inner {
    state: LifecycleState,
    /// At most one armed renewal; arming always cancels the previous token.
    renewal: Option<CancellationToken>,
}

/// Owns the single authoritative session and its renewal chain.
pub struct SessionManager {
    idp: Arc<dyn IdentityProvider>,
    binding: TokenBinding,
    inner: Mutex<Inner>,
    event_tx: broadcast::Sender<SessionEvent>,
    /// Self-handle for spawning renewal tasks.
    weak: Weak<SessionManager>,
}

impl SessionManager {
    pub fn new(idp: Arc<dyn IdentityProvider>, binding: TokenBinding) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(16);
        Arc::new_cyclic(|weak| Self {
            idp,
            binding,
            inner: Mutex::new(Inner { state: LifecycleState::Loading, renewal: None }),
            event_tx,
            weak: weak.clone(),
        })
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Observable state for the route guard and views.
    pub fn snapshot(&self) -> AuthSnapshot {
        let inner = self.inner.lock();
        match &inner.state {
            LifecycleState::Loading => {
                AuthSnapshot { loading: true, authenticated: false, display_name: None }
            }
            LifecycleState::Authenticated(session) => AuthSnapshot {
                loading: false,
                authenticated: true,
                display_name: Some(session.display_name.clone()),
            },
            LifecycleState::Unauthenticated => {
                AuthSnapshot { loading: false, authenticated: false, display_name: None }
            }
        }
    }

    /// Resolve any previously established provider session. Runs once at
    /// process start; absence or failure resolves to unauthenticated.
    pub async fn initialize(&self) {
        match self.idp.current_session().await {
            Ok(Some(raw)) => {
                let session = self.apply_session(raw, None).await;
                tracing::info!(display_name = %session.display_name, "restored provider session");
            }
            Ok(None) => {
                self.clear(ClearReason::SessionLost, None);
            }
            Err(e) => {
                tracing::warn!(err = %e, "initial session resolution failed");
                self.clear(ClearReason::SessionLost, None);
            }
        }
    }

    /// Sign in and apply the returned session.
    ///
    /// Identity-provider rejections propagate unchanged; distinguishing an
    /// unconfirmed account from bad credentials is the caller's concern.
    pub async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        let raw = self.idp.sign_in(identifier, secret).await?;
        Ok(self.apply_session(raw, None).await)
    }

    /// Locally sign out.
    ///
    /// The remote invalidation is spawned best-effort (a failing or hanging
    /// provider must not block sign-out); the renewal is cancelled and the
    /// binding cleared before this returns.
    pub fn sign_out(&self) {
        let idp = Arc::clone(&self.idp);
        tokio::spawn(async move {
            if let Err(e) = idp.sign_out().await {
                tracing::debug!(err = %e, "remote sign-out failed");
            }
        });
        self.clear(ClearReason::SignedOut, None);
    }

    /// Cancel any pending renewal without changing lifecycle state. Called
    /// when the owning context is being discarded, so a renewal cannot fire
    /// into a defunct context.
    pub fn teardown(&self) {
        let mut inner = self.inner.lock();
        if let Some(renewal) = inner.renewal.take() {
            renewal.cancel();
        }
    }

    /// Apply a raw identity-provider session: decode claims, resolve the
    /// display name, then commit state + binding and arm the next renewal
    /// as one unit. `guard` is the renewal token that produced `raw`, if
    /// any; a guard cancelled while the provider call was in flight aborts
    /// the commit (the session was signed out or superseded meanwhile).
    async fn apply_session(&self, raw: IdpSession, guard: Option<&CancellationToken>) -> Session {
        let claims = Claims::decode(&raw.credential);
        let display_name = self.resolve_display_name(&claims, &raw.principal).await;
        let session = Session {
            credential: raw.credential,
            claims,
            principal: raw.principal,
            display_name,
        };
        self.commit(session.clone(), guard);
        session
    }

    /// Commit an applied session. Critical section: no await between the
    /// binding update, the state transition, and arming the renewal.
    fn commit(&self, session: Session, guard: Option<&CancellationToken>) {
        let now = epoch_secs();
        let expires_at = session.claims.expires_at();
        let delay = renewal_delay(expires_at, now);
        let display_name = session.display_name.clone();

        {
            let mut inner = self.inner.lock();
            if guard.is_some_and(CancellationToken::is_cancelled) {
                return;
            }
            if let Some(prev) = inner.renewal.take() {
                prev.cancel();
            }
            self.binding.install(session.credential.clone());
            inner.state = LifecycleState::Authenticated(session);
            // Cancel-then-rearm is atomic: the new token is stored and the
            // timer spawned under the same lock that cancelled the old one.
            let renewal = CancellationToken::new();
            inner.renewal = Some(renewal.clone());
            self.arm_renewal(delay, renewal);
        }

        tracing::debug!(delay_secs = delay.as_secs(), "session applied, renewal armed");
        let _ = self.event_tx.send(SessionEvent::Established { display_name, expires_at });
    }

    /// Clear the session: cancel the renewal, drop the binding, transition
    /// to unauthenticated. A cancelled `guard` aborts the clear (the result
    /// arriving from a superseded renewal must be a no-op).
    fn clear(&self, reason: ClearReason, guard: Option<&CancellationToken>) {
        {
            let mut inner = self.inner.lock();
            if guard.is_some_and(CancellationToken::is_cancelled) {
                return;
            }
            if let Some(renewal) = inner.renewal.take() {
                renewal.cancel();
            }
            self.binding.clear();
            inner.state = LifecycleState::Unauthenticated;
        }
        let _ = self.event_tx.send(SessionEvent::Cleared { reason });
    }

    /// Arm the one-shot renewal timer. On fire, ask the provider for the
    /// current session; success re-applies it (which arms the next renewal
    /// in turn), absence or failure is terminal session loss.
    fn arm_renewal(&self, delay: Duration, cancel: CancellationToken) {
        let Some(manager) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => manager.renew(cancel).await,
            }
        });
    }

    async fn renew(&self, cancel: CancellationToken) {
        match self.idp.current_session().await {
            Ok(Some(raw)) => {
                self.apply_session(raw, Some(&cancel)).await;
            }
            Ok(None) => {
                tracing::info!("renewal found no provider session, signing out locally");
                self.clear(ClearReason::SessionLost, Some(&cancel));
            }
            Err(e) => {
                // Renewal failure almost always means the provider already
                // invalidated the underlying session; no retry, the next
                // user action is to re-authenticate.
                tracing::warn!(err = %e, "session renewal failed");
                self.clear(ClearReason::SessionLost, Some(&cancel));
            }
        }
    }

    /// Resolve the display name by priority: name claim, given-name claim,
    /// provider attribute lookup (name, then email), email claim, principal
    /// identifier, fixed fallback.
    async fn resolve_display_name(&self, claims: &Claims, principal: &Principal) -> String {
        if let Some(name) = claims.name() {
            return name.to_owned();
        }
        if let Some(given) = claims.given_name() {
            return given.to_owned();
        }
        // Extra round trip, tolerated only when the claims are insufficient.
        match self.idp.user_attributes(principal).await {
            Ok(attrs) => {
                for key in ["name", "email"] {
                    if let Some(value) = attrs.get(key).filter(|v| !v.is_empty()) {
                        return value.clone();
                    }
                }
            }
            Err(e) => {
                tracing::debug!(err = %e, "user attribute lookup failed");
            }
        }
        if let Some(email) = claims.email() {
            return email.to_owned();
        }
        if !principal.id.is_empty() {
            return principal.id.clone();
        }
        FALLBACK_DISPLAY_NAME.to_owned()
    }
}

/// Delay until the next renewal should fire: 60 s before expiry, assuming a
/// 10-minute lifetime when the claims carry none, floored at 5 s.
fn renewal_delay(expires_at: Option<u64>, now: u64) -> Duration {
    let expires_at = expires_at.unwrap_or(now + DEFAULT_LIFETIME_SECS);
    let delay = expires_at.saturating_sub(now).saturating_sub(RENEW_LEAD_SECS);
    Duration::from_secs(delay.max(MIN_RENEW_DELAY_SECS))
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
