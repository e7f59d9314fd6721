// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the remote trips API.
//!
//! Pass-through by design: bodies stay `serde_json::Value`, the gateway does
//! not model domain schemas. The credential is read from the token binding
//! at dispatch time, never cached per call.

use std::time::Duration;

use crate::error::ApiError;
use crate::session::binding::TokenBinding;

/// HTTP client wrapper for the remote trips API.
pub struct TripApi {
    base_url: String,
    binding: TokenBinding,
    client: reqwest::Client,
}

impl TripApi {
    pub fn new(base_url: String, binding: TokenBinding, timeout: Duration) -> Self {
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { base_url: base_url.trim_end_matches('/').to_owned(), binding, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the currently bound credential. Absent credential means no
    /// authorization header at all, never an empty one.
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.binding.current() {
            Some(credential) => req.bearer_auth(credential),
            None => req,
        }
    }

    /// Normalize a response: non-success statuses become [`ApiError`] with
    /// the body's `error`/`message` field when present.
    async fn handle(resp: reqwest::Response) -> Result<serde_json::Value, ApiError> {
        let status = resp.status();
        if status.is_success() {
            let bytes = resp.bytes().await.map_err(ApiError::from)?;
            if bytes.is_empty() {
                return Ok(serde_json::Value::Null);
            }
            serde_json::from_slice(&bytes).map_err(|e| ApiError {
                status: Some(status.as_u16()),
                message: format!("invalid response body: {e}"),
            })
        } else {
            let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
            let message = body
                .get("error")
                .and_then(|v| v.as_str())
                .or_else(|| body.get("message").and_then(|v| v.as_str()))
                .map(str::to_owned)
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(ApiError { status: Some(status.as_u16()), message })
        }
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        let req = self.client.get(self.url(path));
        let resp = self.apply_auth(req).send().await?;
        Self::handle(resp).await
    }

    /// GET that treats upstream 404 as an empty list (collections that the
    /// API only materializes once populated).
    async fn get_json_or_empty(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        match self.get_json(path).await {
            Err(ApiError { status: Some(404), .. }) => Ok(serde_json::json!([])),
            other => other,
        }
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        let req = self.client.post(self.url(path)).json(body);
        let resp = self.apply_auth(req).send().await?;
        Self::handle(resp).await
    }

    async fn put_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        let req = self.client.put(self.url(path)).json(body);
        let resp = self.apply_auth(req).send().await?;
        Self::handle(resp).await
    }

    async fn delete_json(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        let req = self.client.delete(self.url(path));
        let resp = self.apply_auth(req).send().await?;
        Self::handle(resp).await
    }

    // -- Trips ----------------------------------------------------------------

    pub async fn list_trips(&self) -> Result<serde_json::Value, ApiError> {
        self.get_json("/trips").await
    }

    pub async fn get_trip(&self, trip_id: &str) -> Result<serde_json::Value, ApiError> {
        self.get_json(&format!("/trips/{trip_id}")).await
    }

    pub async fn create_trip(
        &self,
        trip: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        self.post_json("/trips", trip).await
    }

    pub async fn delete_trip(&self, trip_id: &str) -> Result<serde_json::Value, ApiError> {
        self.delete_json(&format!("/trips/{trip_id}")).await
    }

    // -- Logistics ------------------------------------------------------------

    pub async fn list_logistics(&self, trip_id: &str) -> Result<serde_json::Value, ApiError> {
        self.get_json_or_empty(&format!("/trips/{trip_id}/logistics")).await
    }

    pub async fn add_logistics(
        &self,
        trip_id: &str,
        item: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        self.post_json(&format!("/trips/{trip_id}/logistics"), item).await
    }

    pub async fn update_logistics(
        &self,
        trip_id: &str,
        item_id: &str,
        item: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        self.put_json(&format!("/trips/{trip_id}/logistics/{item_id}"), item).await
    }

    pub async fn delete_logistics(
        &self,
        trip_id: &str,
        item_id: &str,
    ) -> Result<serde_json::Value, ApiError> {
        self.delete_json(&format!("/trips/{trip_id}/logistics/{item_id}")).await
    }

    // -- Operational plan -----------------------------------------------------

    pub async fn list_plan(&self, trip_id: &str) -> Result<serde_json::Value, ApiError> {
        self.get_json_or_empty(&format!("/trips/{trip_id}/plan")).await
    }

    pub async fn create_plan_entry(
        &self,
        trip_id: &str,
        entry: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        self.post_json(&format!("/trips/{trip_id}/plan"), entry).await
    }

    pub async fn update_plan_entry(
        &self,
        trip_id: &str,
        entry_id: &str,
        entry: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        self.put_json(&format!("/trips/{trip_id}/plan/{entry_id}"), entry).await
    }

    pub async fn delete_plan_entry(
        &self,
        trip_id: &str,
        entry_id: &str,
    ) -> Result<serde_json::Value, ApiError> {
        self.delete_json(&format!("/trips/{trip_id}/plan/{entry_id}")).await
    }

    // -- Cost summary ---------------------------------------------------------

    pub async fn cost_summary(
        &self,
        trip_id: &str,
        people: Option<u32>,
    ) -> Result<serde_json::Value, ApiError> {
        let path = match people {
            Some(people) => format!("/trips/{trip_id}/cost-summary?people={people}"),
            None => format!("/trips/{trip_id}/cost-summary"),
        };
        self.get_json(&path).await
    }
}
