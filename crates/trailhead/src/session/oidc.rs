// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the managed identity provider.
//!
//! Holds the provider's underlying token set (credential + refresh token)
//! internally, so `current_session` can hand back a fresh credential without
//! the session manager knowing about refresh mechanics.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::AuthError;
use crate::session::epoch_secs;
use crate::session::idp::{IdentityProvider, IdpSession, Principal, UserAttributes};

/// Consider the stored credential stale this long before its own expiry, so
/// a credential handed out by `current_session` has usable life left.
const STALE_MARGIN_SECS: u64 = 30;

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: u64,
}

/// The provider's underlying token set for the signed-in principal.
#[derive(Debug, Clone)]
struct StoredTokens {
    principal: Principal,
    id_token: String,
    refresh_token: Option<String>,
    /// Epoch seconds when the stored credential goes stale.
    expires_at: u64,
}

pub struct OidcClient {
    base_url: String,
    client_id: String,
    http: reqwest::Client,
    store: Mutex<Option<StoredTokens>>,
}

impl OidcClient {
    pub fn new(config: &AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.idp_timeout())
            .build()
            .unwrap_or_default();
        Self {
            base_url: config.idp_url.trim_end_matches('/').to_owned(),
            client_id: config.idp_client_id.clone(),
            http,
            store: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn remember(&self, principal: Principal, token: &TokenResponse) {
        let mut store = self.store.lock();
        // A refresh response may omit the refresh token; keep the old one.
        let refresh_token = token
            .refresh_token
            .clone()
            .or_else(|| store.as_ref().and_then(|s| s.refresh_token.clone()));
        *store = Some(StoredTokens {
            principal,
            id_token: token.id_token.clone(),
            refresh_token,
            expires_at: epoch_secs() + token.expires_in,
        });
    }

    /// Map a non-success token-endpoint response onto the auth taxonomy.
    async fn auth_error_from(resp: reqwest::Response) -> AuthError {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if text.contains("unconfirmed") || text.contains("UserNotConfirmed") {
            return AuthError::UnconfirmedAccount;
        }
        let rejected = status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNAUTHORIZED;
        if rejected && (text.contains("invalid_grant") || text.contains("NotAuthorized")) {
            return AuthError::BadCredentials;
        }
        AuthError::Provider(format!("{status}: {text}"))
    }

    async fn token_or_error(resp: reqwest::Response) -> Result<TokenResponse, AuthError> {
        if !resp.status().is_success() {
            return Err(Self::auth_error_from(resp).await);
        }
        resp.json::<TokenResponse>().await.map_err(|e| AuthError::Provider(e.to_string()))
    }

    async fn ok_or_error(resp: reqwest::Response) -> Result<(), AuthError> {
        if !resp.status().is_success() {
            return Err(Self::auth_error_from(resp).await);
        }
        Ok(())
    }

    /// Single refresh-grant request against the token endpoint.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let resp = self
            .http
            .post(self.url("/oauth/token"))
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", &self.client_id),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        Self::token_or_error(resp).await
    }
}

#[async_trait]
impl IdentityProvider for OidcClient {
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<IdpSession, AuthError> {
        let resp = self
            .http
            .post(self.url("/oauth/token"))
            .form(&[
                ("grant_type", "password"),
                ("client_id", &self.client_id),
                ("username", identifier),
                ("password", secret),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        let token = Self::token_or_error(resp).await?;

        let principal = Principal { id: identifier.to_owned() };
        self.remember(principal.clone(), &token);
        Ok(IdpSession { principal, credential: token.id_token })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        // Drop local state first: sign-out succeeds locally no matter what
        // the revocation endpoint does.
        let refresh_token = self.store.lock().take().and_then(|s| s.refresh_token);
        let Some(refresh_token) = refresh_token else {
            return Ok(());
        };
        let resp = self
            .http
            .post(self.url("/oauth/revoke"))
            .form(&[("client_id", self.client_id.as_str()), ("token", refresh_token.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        Self::ok_or_error(resp).await
    }

    async fn current_session(&self) -> Result<Option<IdpSession>, AuthError> {
        let stale = {
            let store = self.store.lock();
            let Some(stored) = store.as_ref() else {
                return Ok(None);
            };
            if stored.expires_at > epoch_secs() + STALE_MARGIN_SECS {
                return Ok(Some(IdpSession {
                    principal: stored.principal.clone(),
                    credential: stored.id_token.clone(),
                }));
            }
            stored.clone()
        };

        let Some(refresh_token) = stale.refresh_token else {
            // Nothing to refresh with; the session is gone.
            *self.store.lock() = None;
            return Ok(None);
        };

        match self.refresh(&refresh_token).await {
            Ok(token) => {
                self.remember(stale.principal.clone(), &token);
                Ok(Some(IdpSession { principal: stale.principal, credential: token.id_token }))
            }
            Err(AuthError::Provider(msg)) => Err(AuthError::Provider(msg)),
            Err(e) => {
                // The provider rejected the refresh grant outright; the
                // underlying session is invalid.
                tracing::debug!(err = %e, "refresh grant rejected");
                *self.store.lock() = None;
                Ok(None)
            }
        }
    }

    async fn user_attributes(&self, _principal: &Principal) -> Result<UserAttributes, AuthError> {
        let credential = self
            .store
            .lock()
            .as_ref()
            .map(|s| s.id_token.clone())
            .ok_or_else(|| AuthError::Provider("no stored session for attribute lookup".into()))?;
        let resp = self
            .http
            .get(self.url("/oauth/userinfo"))
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::auth_error_from(resp).await);
        }
        let raw: HashMap<String, serde_json::Value> =
            resp.json().await.map_err(|e| AuthError::Provider(e.to_string()))?;
        Ok(raw
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_owned())))
            .collect())
    }

    async fn sign_up(
        &self,
        identifier: &str,
        secret: &str,
        name: Option<&str>,
    ) -> Result<(), AuthError> {
        let mut body = serde_json::json!({
            "client_id": self.client_id,
            "username": identifier,
            "password": secret,
        });
        if let Some(name) = name {
            body["attributes"] = serde_json::json!({ "name": name });
        }
        let resp = self
            .http
            .post(self.url("/signup"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        Self::ok_or_error(resp).await
    }

    async fn confirm_sign_up(&self, identifier: &str, code: &str) -> Result<(), AuthError> {
        let resp = self
            .http
            .post(self.url("/signup/confirm"))
            .json(&serde_json::json!({
                "client_id": self.client_id,
                "username": identifier,
                "code": code,
            }))
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        Self::ok_or_error(resp).await
    }

    async fn resend_confirmation(&self, identifier: &str) -> Result<(), AuthError> {
        let resp = self
            .http
            .post(self.url("/signup/resend"))
            .json(&serde_json::json!({
                "client_id": self.client_id,
                "username": identifier,
            }))
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        Self::ok_or_error(resp).await
    }
}

#[cfg(test)]
#[path = "oidc_tests.rs"]
mod tests;
