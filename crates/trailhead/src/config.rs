// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the trailhead gateway.
#[derive(Debug, Clone, clap::Parser)]
pub struct AppConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "TRAILHEAD_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8720, env = "TRAILHEAD_PORT")]
    pub port: u16,

    /// Base URL of the managed identity provider.
    #[arg(long, default_value = "https://id.trailhead.example", env = "TRAILHEAD_IDP_URL")]
    pub idp_url: String,

    /// Client identifier registered with the identity provider.
    #[arg(long, default_value = "trailhead-web", env = "TRAILHEAD_IDP_CLIENT_ID")]
    pub idp_client_id: String,

    /// Base URL of the remote trips API.
    #[arg(long, default_value = "https://api.trailhead.example/api", env = "TRAILHEAD_API_URL")]
    pub api_url: String,

    /// Identity-provider request timeout in seconds.
    #[arg(long, default_value_t = 30, env = "TRAILHEAD_IDP_TIMEOUT_SECS")]
    pub idp_timeout_secs: u64,

    /// Trips API request timeout in seconds.
    #[arg(long, default_value_t = 15, env = "TRAILHEAD_API_TIMEOUT_SECS")]
    pub api_timeout_secs: u64,
}

impl AppConfig {
    pub fn idp_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.idp_timeout_secs)
    }

    pub fn api_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.api_timeout_secs)
    }
}
