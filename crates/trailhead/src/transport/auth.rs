// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route guard: gates protected endpoints on the session lifecycle state.

use std::sync::Arc;

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::state::AppState;

/// Paths that bypass the guard: health, the auth flow itself, and WebSocket
/// upgrades (the session stream must be reachable while signed out).
fn exempt(path: &str) -> bool {
    path == "/api/v1/health" || path.starts_with("/api/v1/auth/") || path.starts_with("/ws/")
}

/// Axum middleware enforcing an authenticated session on protected routes.
///
/// `Loading` is not a rejection: the initial provider round trip is still
/// in flight, so clients get a retryable 503 instead of a sign-in redirect.
pub async fn guard_layer(
    State(state): State<Arc<AppState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if exempt(req.uri().path()) {
        return next.run(req).await;
    }

    let snapshot = state.session.snapshot();
    if snapshot.authenticated {
        return next.run(req).await;
    }
    if snapshot.loading {
        return GatewayError::AuthPending
            .to_http_response("session resolution in flight")
            .into_response();
    }
    GatewayError::Unauthorized.to_http_response("sign in required").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exempt_paths() {
        assert!(exempt("/api/v1/health"));
        assert!(exempt("/api/v1/auth/login"));
        assert!(exempt("/api/v1/auth/session"));
        assert!(exempt("/ws/session"));
        assert!(!exempt("/api/v1/trips"));
        assert!(!exempt("/api/v1/trips/t1/logistics"));
    }
}
