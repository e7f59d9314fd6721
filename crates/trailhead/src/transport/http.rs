// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the domain pass-through endpoints.
//!
//! Thin by design: extract, delegate to [`TripApi`], normalize errors.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, GatewayError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// `GET /api/v1/health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "running".to_owned() })
}

/// Map an upstream failure onto a gateway response, keeping upstream 404s
/// as 404s so the UI can distinguish a missing trip from a broken upstream.
fn upstream_error(e: ApiError) -> Response {
    let gateway = match e.status {
        Some(404) => GatewayError::NotFound,
        _ => GatewayError::UpstreamError,
    };
    gateway.to_http_response(e.to_string()).into_response()
}

fn passthrough(result: Result<serde_json::Value, ApiError>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => upstream_error(e),
    }
}

// -- Trips --------------------------------------------------------------------

/// `GET /api/v1/trips`
pub async fn list_trips(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    passthrough(s.trips.list_trips().await)
}

/// `POST /api/v1/trips`
pub async fn create_trip(
    State(s): State<Arc<AppState>>,
    Json(trip): Json<serde_json::Value>,
) -> impl IntoResponse {
    passthrough(s.trips.create_trip(&trip).await)
}

/// `GET /api/v1/trips/{trip_id}`
pub async fn get_trip(
    State(s): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> impl IntoResponse {
    passthrough(s.trips.get_trip(&trip_id).await)
}

/// `DELETE /api/v1/trips/{trip_id}`
pub async fn delete_trip(
    State(s): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> impl IntoResponse {
    passthrough(s.trips.delete_trip(&trip_id).await)
}

// -- Logistics ----------------------------------------------------------------

/// `GET /api/v1/trips/{trip_id}/logistics`
pub async fn list_logistics(
    State(s): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> impl IntoResponse {
    passthrough(s.trips.list_logistics(&trip_id).await)
}

/// `POST /api/v1/trips/{trip_id}/logistics`
pub async fn add_logistics(
    State(s): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Json(item): Json<serde_json::Value>,
) -> impl IntoResponse {
    passthrough(s.trips.add_logistics(&trip_id, &item).await)
}

/// `PUT /api/v1/trips/{trip_id}/logistics/{item_id}`
pub async fn update_logistics(
    State(s): State<Arc<AppState>>,
    Path((trip_id, item_id)): Path<(String, String)>,
    Json(item): Json<serde_json::Value>,
) -> impl IntoResponse {
    passthrough(s.trips.update_logistics(&trip_id, &item_id, &item).await)
}

/// `DELETE /api/v1/trips/{trip_id}/logistics/{item_id}`
pub async fn delete_logistics(
    State(s): State<Arc<AppState>>,
    Path((trip_id, item_id)): Path<(String, String)>,
) -> impl IntoResponse {
    passthrough(s.trips.delete_logistics(&trip_id, &item_id).await)
}

// -- Operational plan ---------------------------------------------------------

/// `GET /api/v1/trips/{trip_id}/plan`
pub async fn list_plan(
    State(s): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
) -> impl IntoResponse {
    passthrough(s.trips.list_plan(&trip_id).await)
}

/// `POST /api/v1/trips/{trip_id}/plan`
pub async fn create_plan_entry(
    State(s): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Json(entry): Json<serde_json::Value>,
) -> impl IntoResponse {
    passthrough(s.trips.create_plan_entry(&trip_id, &entry).await)
}

/// `PUT /api/v1/trips/{trip_id}/plan/{entry_id}`
pub async fn update_plan_entry(
    State(s): State<Arc<AppState>>,
    Path((trip_id, entry_id)): Path<(String, String)>,
    Json(entry): Json<serde_json::Value>,
) -> impl IntoResponse {
    passthrough(s.trips.update_plan_entry(&trip_id, &entry_id, &entry).await)
}

/// `DELETE /api/v1/trips/{trip_id}/plan/{entry_id}`
pub async fn delete_plan_entry(
    State(s): State<Arc<AppState>>,
    Path((trip_id, entry_id)): Path<(String, String)>,
) -> impl IntoResponse {
    passthrough(s.trips.delete_plan_entry(&trip_id, &entry_id).await)
}

// -- Cost summary -------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CostQuery {
    pub people: Option<u32>,
}

/// `GET /api/v1/trips/{trip_id}/cost-summary[?people=N]`
pub async fn cost_summary(
    State(s): State<Arc<AppState>>,
    Path(trip_id): Path<String>,
    Query(query): Query<CostQuery>,
) -> impl IntoResponse {
    passthrough(s.trips.cost_summary(&trip_id, query.people).await)
}
