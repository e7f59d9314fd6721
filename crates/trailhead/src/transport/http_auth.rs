// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the authentication endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, GatewayError};
use crate::state::AppState;

fn auth_error(e: &AuthError) -> axum::response::Response {
    GatewayError::from(e).to_http_response(e.to_string()).into_response()
}

// -- Sign-in / sign-out -------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub secret: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub authenticated: bool,
    pub display_name: String,
}

/// `POST /api/v1/auth/login`
pub async fn login(
    State(s): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    match s.session.sign_in(&req.identifier, &req.secret).await {
        Ok(session) => {
            Json(LoginResponse { authenticated: true, display_name: session.display_name })
                .into_response()
        }
        Err(e) => auth_error(&e),
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub signed_out: bool,
}

/// `POST /api/v1/auth/logout` — always succeeds locally.
pub async fn logout(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    s.session.sign_out();
    Json(LogoutResponse { signed_out: true })
}

/// `GET /api/v1/auth/session` — observable snapshot for the route guard.
pub async fn session(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(s.session.snapshot())
}

// -- Registration flow --------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub identifier: String,
    pub secret: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// `POST /api/v1/auth/signup`
pub async fn signup(
    State(s): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> impl IntoResponse {
    match s.idp.sign_up(&req.identifier, &req.secret, req.name.as_deref()).await {
        Ok(()) => Json(serde_json::json!({ "registered": true })).into_response(),
        Err(e) => auth_error(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub identifier: String,
    pub code: String,
}

/// `POST /api/v1/auth/confirm`
pub async fn confirm(
    State(s): State<Arc<AppState>>,
    Json(req): Json<ConfirmRequest>,
) -> impl IntoResponse {
    match s.idp.confirm_sign_up(&req.identifier, &req.code).await {
        Ok(()) => Json(serde_json::json!({ "confirmed": true })).into_response(),
        Err(e) => auth_error(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub identifier: String,
}

/// `POST /api/v1/auth/resend`
pub async fn resend(
    State(s): State<Arc<AppState>>,
    Json(req): Json<ResendRequest>,
) -> impl IntoResponse {
    match s.idp.resend_confirmation(&req.identifier).await {
        Ok(()) => Json(serde_json::json!({ "resent": true })).into_response(),
        Err(e) => auth_error(&e),
    }
}
