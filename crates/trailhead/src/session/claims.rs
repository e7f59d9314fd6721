// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lenient credential claims decoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Claims mapping decoded from a signed credential.
///
/// Decoding is lenient by contract: any malformed credential (wrong segment
/// count, invalid base64url, invalid JSON, non-object payload) yields an
/// empty mapping, and callers treat absent claims as unknown rather than as
/// an error. Claim shape is owned by the identity provider and varies
/// between environments, so absence must never fail session establishment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims(serde_json::Map<String, serde_json::Value>);

impl Claims {
    /// Decode the middle (payload) segment of a three-segment credential.
    pub fn decode(credential: &str) -> Self {
        let mut segments = credential.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Self::default(),
        };
        let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload) else {
            return Self::default();
        };
        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(serde_json::Value::Object(map)) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A string claim, treating absent, non-string, or empty values as unknown.
    fn str_claim(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
    }

    pub fn subject(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_claim("name")
    }

    pub fn given_name(&self) -> Option<&str> {
        self.str_claim("given_name")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_claim("email")
    }

    /// Expiry instant in epoch seconds.
    pub fn expires_at(&self) -> Option<u64> {
        self.0.get("exp").and_then(serde_json::Value::as_u64)
    }

    /// Issue instant in epoch seconds.
    pub fn issued_at(&self) -> Option<u64> {
        self.0.get("iat").and_then(serde_json::Value::as_u64)
    }
}

#[cfg(test)]
#[path = "claims_tests.rs"]
mod tests;
