// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity-provider rejection surfaced to sign-in callers.
///
/// Only these cross the session component boundary as errors; every other
/// failure is absorbed into a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The provider rejected the identifier/secret pair.
    BadCredentials,
    /// The account exists but has not completed confirmation.
    UnconfirmedAccount,
    /// Any other provider-side failure.
    Provider(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadCredentials => f.write_str("bad credentials"),
            Self::UnconfirmedAccount => f.write_str("account not confirmed"),
            Self::Provider(msg) => write!(f, "identity provider error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Failure talking to the remote trips API.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Upstream HTTP status, when the request got that far.
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "upstream {status}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self { status: e.status().map(|s| s.as_u16()), message: e.to_string() }
    }
}

/// Error codes for the gateway API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayError {
    Unauthorized,
    /// Initial session resolution is still in flight.
    AuthPending,
    BadCredentials,
    UnconfirmedAccount,
    NotFound,
    UpstreamError,
}

impl GatewayError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::AuthPending => 503,
            Self::BadCredentials => 401,
            Self::UnconfirmedAccount => 403,
            Self::NotFound => 404,
            Self::UpstreamError => 502,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AuthPending => "AUTH_PENDING",
            Self::BadCredentials => "BAD_CREDENTIALS",
            Self::UnconfirmedAccount => "UNCONFIRMED_ACCOUNT",
            Self::NotFound => "NOT_FOUND",
            Self::UpstreamError => "UPSTREAM_ERROR",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&AuthError> for GatewayError {
    fn from(e: &AuthError) -> Self {
        match e {
            AuthError::BadCredentials => Self::BadCredentials,
            AuthError::UnconfirmedAccount => Self::UnconfirmedAccount,
            AuthError::Provider(_) => Self::UpstreamError,
        }
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
