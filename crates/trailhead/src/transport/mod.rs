// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport for the trailhead gateway.

pub mod auth;
pub mod http;
pub mod http_auth;
pub mod ws;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum `Router` with all gateway routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(http::health))
        // Registration flow
        .route("/api/v1/auth/signup", post(http_auth::signup))
        .route("/api/v1/auth/confirm", post(http_auth::confirm))
        .route("/api/v1/auth/resend", post(http_auth::resend))
        // Session lifecycle
        .route("/api/v1/auth/login", post(http_auth::login))
        .route("/api/v1/auth/logout", post(http_auth::logout))
        .route("/api/v1/auth/session", get(http_auth::session))
        // Domain pass-through (guarded)
        .route("/api/v1/trips", get(http::list_trips).post(http::create_trip))
        .route("/api/v1/trips/{trip_id}", get(http::get_trip).delete(http::delete_trip))
        .route(
            "/api/v1/trips/{trip_id}/logistics",
            get(http::list_logistics).post(http::add_logistics),
        )
        .route(
            "/api/v1/trips/{trip_id}/logistics/{item_id}",
            put(http::update_logistics).delete(http::delete_logistics),
        )
        .route("/api/v1/trips/{trip_id}/plan", get(http::list_plan).post(http::create_plan_entry))
        .route(
            "/api/v1/trips/{trip_id}/plan/{entry_id}",
            put(http::update_plan_entry).delete(http::delete_plan_entry),
        )
        .route("/api/v1/trips/{trip_id}/cost-summary", get(http::cost_summary))
        // Session event stream
        .route("/ws/session", get(ws::ws_session_handler))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), auth::guard_layer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
