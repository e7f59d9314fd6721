// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tokio::sync::Semaphore;
use yare::parameterized;

use crate::session::idp::UserAttributes;

/// Permits on the provider-call gate when fully open.
const GATE_PERMITS: u32 = 1024;

/// Scriptable identity provider. `gate` throttles provider calls so tests
/// can hold a call in flight; it starts fully open.
struct FakeIdp {
    sign_in_result: Mutex<Option<Result<IdpSession, AuthError>>>,
    current_queue: Mutex<VecDeque<Result<Option<IdpSession>, AuthError>>>,
    current_default: Mutex<Option<IdpSession>>,
    attributes: Mutex<UserAttributes>,
    gate: Semaphore,
    current_calls: AtomicU32,
    sign_out_calls: AtomicU32,
    fail_sign_out: bool,
}

impl Default for FakeIdp {
    fn default() -> Self {
        Self {
            sign_in_result: Mutex::new(None),
            current_queue: Mutex::new(VecDeque::new()),
            current_default: Mutex::new(None),
            attributes: Mutex::new(UserAttributes::new()),
            gate: Semaphore::new(GATE_PERMITS as usize),
            current_calls: AtomicU32::new(0),
            sign_out_calls: AtomicU32::new(0),
            fail_sign_out: false,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdp {
    async fn sign_in(&self, _identifier: &str, _secret: &str) -> Result<IdpSession, AuthError> {
        self.sign_in_result.lock().clone().unwrap_or(Err(AuthError::BadCredentials))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let _ = self.gate.acquire().await;
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out {
            return Err(AuthError::Provider("revocation endpoint unreachable".into()));
        }
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<IdpSession>, AuthError> {
        let _ = self.gate.acquire().await;
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.current_queue.lock().pop_front() {
            return next;
        }
        Ok(self.current_default.lock().clone())
    }

    async fn user_attributes(&self, _principal: &Principal) -> Result<UserAttributes, AuthError> {
        Ok(self.attributes.lock().clone())
    }

    async fn sign_up(
        &self,
        _identifier: &str,
        _secret: &str,
        _name: Option<&str>,
    ) -> Result<(), AuthError> {
        Ok(())
    }

    async fn confirm_sign_up(&self, _identifier: &str, _code: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn resend_confirmation(&self, _identifier: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

fn forge_credential(claims: &serde_json::Value) -> String {
    format!("eyJhbGciOiJSUzI1NiJ9.{}.c2ln", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

fn raw_session(claims: serde_json::Value) -> IdpSession {
    IdpSession { principal: Principal { id: "u-1042".into() }, credential: forge_credential(&claims) }
}

fn claims_expiring_in(secs: u64, extra: serde_json::Value) -> serde_json::Value {
    let mut claims = serde_json::json!({ "exp": epoch_secs() + secs });
    if let (Some(claims), Some(extra)) = (claims.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            claims.insert(k.clone(), v.clone());
        }
    }
    claims
}

fn manager_with(idp: FakeIdp) -> (Arc<SessionManager>, TokenBinding, Arc<FakeIdp>) {
    let idp = Arc::new(idp);
    let binding = TokenBinding::new();
    let manager =
        SessionManager::new(Arc::clone(&idp) as Arc<dyn IdentityProvider>, binding.clone());
    (manager, binding, idp)
}

/// Let spawned renewal tasks run to their next suspension point.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

// -- Initial resolution -------------------------------------------------------

#[tokio::test]
async fn initialize_restores_provider_session() {
    let fake = FakeIdp::default();
    let session = raw_session(claims_expiring_in(300, serde_json::json!({ "name": "Amira" })));
    let credential = session.credential.clone();
    *fake.current_default.lock() = Some(session);

    let (manager, binding, _idp) = manager_with(fake);
    manager.initialize().await;

    let snapshot = manager.snapshot();
    assert!(snapshot.authenticated);
    assert!(!snapshot.loading);
    assert_eq!(snapshot.display_name.as_deref(), Some("Amira"));
    assert_eq!(binding.current(), Some(credential));
}

#[tokio::test]
async fn initialize_without_session_resolves_unauthenticated() {
    let (manager, binding, _idp) = manager_with(FakeIdp::default());
    assert!(manager.snapshot().loading);

    manager.initialize().await;

    let snapshot = manager.snapshot();
    assert!(!snapshot.loading);
    assert!(!snapshot.authenticated);
    assert_eq!(binding.current(), None);
}

#[tokio::test]
async fn initialize_failure_resolves_unauthenticated() {
    let fake = FakeIdp::default();
    fake.current_queue
        .lock()
        .push_back(Err(AuthError::Provider("connection refused".into())));

    let (manager, binding, _idp) = manager_with(fake);
    manager.initialize().await;

    assert!(!manager.snapshot().authenticated);
    assert_eq!(binding.current(), None);
}

// -- Sign-in ------------------------------------------------------------------

#[tokio::test]
async fn sign_in_applies_session_and_binds_credential() -> anyhow::Result<()> {
    let fake = FakeIdp::default();
    let session = raw_session(claims_expiring_in(300, serde_json::json!({ "name": "Amira" })));
    let credential = session.credential.clone();
    *fake.sign_in_result.lock() = Some(Ok(session));

    let (manager, binding, _idp) = manager_with(fake);
    let applied = manager.sign_in("amira@example.com", "s3cret").await?;

    assert_eq!(applied.display_name, "Amira");
    assert_eq!(applied.principal.id, "u-1042");
    assert_eq!(binding.current(), Some(credential));
    assert!(manager.snapshot().authenticated);
    Ok(())
}

#[tokio::test]
async fn sign_in_rejection_propagates_unchanged() {
    let (manager, binding, _idp) = manager_with(FakeIdp::default());

    let err = manager.sign_in("amira@example.com", "wrong").await;
    assert!(matches!(err, Err(AuthError::BadCredentials)));

    // A rejected sign-in changes nothing.
    assert!(manager.snapshot().loading);
    assert_eq!(binding.current(), None);
}

#[tokio::test]
async fn sign_in_unconfirmed_propagates_unchanged() {
    let fake = FakeIdp::default();
    *fake.sign_in_result.lock() = Some(Err(AuthError::UnconfirmedAccount));

    let (manager, _binding, _idp) = manager_with(fake);
    let err = manager.sign_in("new@example.com", "s3cret").await;
    assert!(matches!(err, Err(AuthError::UnconfirmedAccount)));
}

// -- Sign-out -----------------------------------------------------------------

#[tokio::test]
async fn sign_out_clears_locally_even_when_remote_fails() {
    let mut fake = FakeIdp::default();
    fake.fail_sign_out = true;
    let session = raw_session(claims_expiring_in(300, serde_json::json!({ "name": "Amira" })));
    *fake.sign_in_result.lock() = Some(Ok(session));

    let (manager, binding, idp) = manager_with(fake);
    let _ = manager.sign_in("amira@example.com", "s3cret").await;

    manager.sign_out();

    // Cleared before any remote round trip resolves.
    assert_eq!(binding.current(), None);
    let snapshot = manager.snapshot();
    assert!(!snapshot.authenticated);
    assert!(!snapshot.loading);

    settle().await;
    assert_eq!(idp.sign_out_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sign_out_clears_locally_while_remote_hangs() {
    let fake = FakeIdp::default();
    let session = raw_session(claims_expiring_in(300, serde_json::json!({ "name": "Amira" })));
    *fake.sign_in_result.lock() = Some(Ok(session));

    let (manager, binding, idp) = manager_with(fake);
    let _ = manager.sign_in("amira@example.com", "s3cret").await;

    // Close the gate: the remote invalidation call will never return.
    let _held = idp.gate.try_acquire_many(GATE_PERMITS);

    manager.sign_out();
    assert_eq!(binding.current(), None);
    assert!(!manager.snapshot().authenticated);
}

// -- Display-name resolution --------------------------------------------------

async fn resolved_name(claims: serde_json::Value, attributes: UserAttributes) -> String {
    let fake = FakeIdp::default();
    *fake.attributes.lock() = attributes;
    *fake.sign_in_result.lock() = Some(Ok(raw_session(claims)));
    let (manager, _binding, _idp) = manager_with(fake);
    match manager.sign_in("amira@example.com", "s3cret").await {
        Ok(session) => session.display_name,
        Err(e) => format!("sign-in failed: {e}"),
    }
}

#[tokio::test]
async fn name_claim_wins() {
    let claims = serde_json::json!({ "name": "A", "given_name": "G", "email": "a@x.com" });
    assert_eq!(resolved_name(claims, UserAttributes::new()).await, "A");
}

#[tokio::test]
async fn given_name_claim_when_no_name() {
    let claims = serde_json::json!({ "given_name": "B", "email": "b@x.com" });
    assert_eq!(resolved_name(claims, UserAttributes::new()).await, "B");
}

#[tokio::test]
async fn attribute_name_when_claims_are_bare() {
    let attrs = UserAttributes::from([
        ("name".to_owned(), "C".to_owned()),
        ("email".to_owned(), "c@x.com".to_owned()),
    ]);
    assert_eq!(resolved_name(serde_json::json!({}), attrs).await, "C");
}

#[tokio::test]
async fn attribute_email_when_no_name_attribute() {
    let attrs = UserAttributes::from([("email".to_owned(), "c@x.com".to_owned())]);
    assert_eq!(resolved_name(serde_json::json!({}), attrs).await, "c@x.com");
}

#[tokio::test]
async fn email_claim_when_attributes_are_empty() {
    let claims = serde_json::json!({ "email": "d@x.com" });
    assert_eq!(resolved_name(claims, UserAttributes::new()).await, "d@x.com");
}

#[tokio::test]
async fn principal_identifier_before_fixed_fallback() {
    assert_eq!(resolved_name(serde_json::json!({}), UserAttributes::new()).await, "u-1042");
}

#[tokio::test]
async fn fixed_fallback_when_nothing_is_usable() {
    let fake = FakeIdp::default();
    *fake.sign_in_result.lock() = Some(Ok(IdpSession {
        principal: Principal { id: String::new() },
        credential: forge_credential(&serde_json::json!({})),
    }));
    let (manager, _binding, _idp) = manager_with(fake);
    let session = manager.sign_in("x", "y").await;
    assert_eq!(session.map(|s| s.display_name), Ok(FALLBACK_DISPLAY_NAME.to_owned()));
}

// -- Renewal scheduling -------------------------------------------------------

#[parameterized(
    five_minutes_out = { Some(300), 240 },
    thirty_seconds_out = { Some(30), 5 },
    already_expired = { Some(0), 5 },
    no_expiry_claim = { None, 540 },
)]
fn renewal_delay_policy(offset: Option<u64>, expected_secs: u64) {
    let now = 1_790_000_000;
    let expires_at = offset.map(|o| now + o);
    assert_eq!(renewal_delay(expires_at, now), Duration::from_secs(expected_secs));
}

#[tokio::test(start_paused = true)]
async fn renewal_applies_fresh_session_and_rearms() {
    let fake = FakeIdp::default();
    *fake.sign_in_result.lock() =
        Some(Ok(raw_session(claims_expiring_in(120, serde_json::json!({ "name": "Amira" })))));
    let renewed = raw_session(claims_expiring_in(600, serde_json::json!({ "name": "Renewed" })));
    let renewed_credential = renewed.credential.clone();
    *fake.current_default.lock() = Some(renewed);

    let (manager, binding, idp) = manager_with(fake);
    let _ = manager.sign_in("amira@example.com", "s3cret").await;
    settle().await;

    // exp − 60 s lead → fires 60 s in.
    tokio::time::advance(Duration::from_secs(61)).await;
    settle().await;

    assert_eq!(idp.current_calls.load(Ordering::SeqCst), 1);
    assert_eq!(manager.snapshot().display_name.as_deref(), Some("Renewed"));
    assert_eq!(binding.current(), Some(renewed_credential));
}

#[tokio::test(start_paused = true)]
async fn arming_supersedes_the_previous_timer() {
    let fake = FakeIdp::default();
    *fake.sign_in_result.lock() =
        Some(Ok(raw_session(claims_expiring_in(65, serde_json::json!({})))));
    let (manager, _binding, idp) = manager_with(fake);

    // First session: renewal due in 5 s.
    let _ = manager.sign_in("amira@example.com", "s3cret").await;
    // Second session supersedes it: renewal due in 540 s.
    *idp.sign_in_result.lock() =
        Some(Ok(raw_session(claims_expiring_in(600, serde_json::json!({})))));
    let _ = manager.sign_in("amira@example.com", "s3cret").await;
    settle().await;

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(idp.current_calls.load(Ordering::SeqCst), 0, "superseded timer fired");

    tokio::time::advance(Duration::from_secs(531)).await;
    settle().await;
    assert_eq!(idp.current_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn teardown_prevents_any_further_transition() {
    let fake = FakeIdp::default();
    *fake.sign_in_result.lock() =
        Some(Ok(raw_session(claims_expiring_in(65, serde_json::json!({ "name": "Amira" })))));
    let (manager, binding, idp) = manager_with(fake);
    let _ = manager.sign_in("amira@example.com", "s3cret").await;

    manager.teardown();

    tokio::time::advance(Duration::from_secs(120)).await;
    settle().await;

    assert_eq!(idp.current_calls.load(Ordering::SeqCst), 0);
    // State is untouched; only the pending renewal is gone.
    assert!(manager.snapshot().authenticated);
    assert!(binding.current().is_some());
}

#[tokio::test(start_paused = true)]
async fn renewal_without_session_is_terminal() {
    let fake = FakeIdp::default();
    *fake.sign_in_result.lock() =
        Some(Ok(raw_session(claims_expiring_in(65, serde_json::json!({})))));
    fake.current_queue.lock().push_back(Ok(None));

    let (manager, binding, _idp) = manager_with(fake);
    let _ = manager.sign_in("amira@example.com", "s3cret").await;
    settle().await;

    tokio::time::advance(Duration::from_secs(6)).await;
    settle().await;

    let snapshot = manager.snapshot();
    assert!(!snapshot.authenticated);
    assert!(!snapshot.loading);
    assert_eq!(binding.current(), None);
}

#[tokio::test(start_paused = true)]
async fn renewal_failure_is_terminal() {
    let fake = FakeIdp::default();
    *fake.sign_in_result.lock() =
        Some(Ok(raw_session(claims_expiring_in(65, serde_json::json!({})))));
    fake.current_queue.lock().push_back(Err(AuthError::Provider("boom".into())));

    let (manager, binding, _idp) = manager_with(fake);
    let _ = manager.sign_in("amira@example.com", "s3cret").await;
    settle().await;

    tokio::time::advance(Duration::from_secs(6)).await;
    settle().await;

    assert!(!manager.snapshot().authenticated);
    assert_eq!(binding.current(), None);
}

#[tokio::test(start_paused = true)]
async fn sign_out_during_inflight_renewal_discards_its_result() {
    let fake = FakeIdp::default();
    *fake.sign_in_result.lock() =
        Some(Ok(raw_session(claims_expiring_in(65, serde_json::json!({})))));
    let (manager, binding, idp) = manager_with(fake);
    let _ = manager.sign_in("amira@example.com", "s3cret").await;

    // Hold the provider call in flight when the timer fires.
    let held = idp.gate.try_acquire_many(GATE_PERMITS);
    tokio::time::advance(Duration::from_secs(6)).await;
    settle().await;

    manager.sign_out();
    assert_eq!(binding.current(), None);

    // Release the in-flight call with a session available: the renewal
    // completed after sign-out and must be a no-op.
    idp.current_queue
        .lock()
        .push_back(Ok(Some(raw_session(claims_expiring_in(600, serde_json::json!({}))))));
    drop(held);
    settle().await;

    assert!(!manager.snapshot().authenticated);
    assert_eq!(binding.current(), None);
}

// -- Events -------------------------------------------------------------------

#[tokio::test]
async fn emits_established_and_cleared_events() -> anyhow::Result<()> {
    let fake = FakeIdp::default();
    *fake.sign_in_result.lock() =
        Some(Ok(raw_session(claims_expiring_in(300, serde_json::json!({ "name": "Amira" })))));
    let (manager, _binding, _idp) = manager_with(fake);

    let mut events = manager.subscribe();
    let _ = manager.sign_in("amira@example.com", "s3cret").await;
    manager.sign_out();

    match events.recv().await? {
        SessionEvent::Established { display_name, expires_at } => {
            assert_eq!(display_name, "Amira");
            assert!(expires_at.is_some());
        }
        other => anyhow::bail!("unexpected event: {other:?}"),
    }
    match events.recv().await? {
        SessionEvent::Cleared { reason } => assert_eq!(reason, ClearReason::SignedOut),
        other => anyhow::bail!("unexpected event: {other:?}"),
    }
    Ok(())
}
