// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trailhead: authenticated gateway for the trip-planning app.
//!
//! Owns the identity-provider session (sign-up, sign-in, proactive renewal,
//! sign-out) and passes domain CRUD through to the remote trips API with
//! the current credential attached.

pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod transport;
pub mod upstream;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::session::binding::TokenBinding;
use crate::session::idp::IdentityProvider;
use crate::session::manager::SessionManager;
use crate::session::oidc::OidcClient;
use crate::state::AppState;
use crate::transport::build_router;
use crate::upstream::client::TripApi;

/// Run the gateway until shutdown.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let binding = TokenBinding::new();
    let idp: Arc<dyn IdentityProvider> = Arc::new(OidcClient::new(&config));
    let session = SessionManager::new(Arc::clone(&idp), binding.clone());
    let trips = TripApi::new(config.api_url.clone(), binding, config.api_timeout());

    // Resolve any previously established provider session without blocking
    // the listener; a slow provider leaves the observable state `loading`.
    {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            session.initialize().await;
        });
    }

    // Cancel the pending renewal before the serve loop unwinds, so a timer
    // cannot fire into a context that is going away.
    {
        let shutdown = shutdown.clone();
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                session.teardown();
                shutdown.cancel();
            }
        });
    }

    let state =
        Arc::new(AppState { config, session, idp, trips, shutdown: shutdown.clone() });

    tracing::info!("trailhead listening on {addr}");
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
