// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::session::idp::IdentityProvider;
use crate::session::manager::SessionManager;
use crate::upstream::client::TripApi;

/// Shared gateway state.
pub struct AppState {
    pub config: AppConfig,
    pub session: Arc<SessionManager>,
    /// The same provider the session manager uses; handlers reach it
    /// directly for the sign-up flow, which never touches session state.
    pub idp: Arc<dyn IdentityProvider>,
    pub trips: TripApi,
    pub shutdown: CancellationToken,
}
