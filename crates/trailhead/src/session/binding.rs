// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared credential slot read by outbound domain API calls.

use std::sync::Arc;

use parking_lot::RwLock;

/// Single-writer, multi-reader slot for the current credential.
///
/// The session manager is the only writer; every outbound domain API call
/// reads the slot immediately before dispatch so a call issued right after
/// a renewal carries the fresh credential. `None` means outbound calls omit
/// the authorization header entirely. The handle is cloned into the API
/// layer at startup rather than living as an ambient global, so tests can
/// inject a fresh instance.
#[derive(Clone, Default)]
pub struct TokenBinding {
    slot: Arc<RwLock<Option<String>>>,
}

impl TokenBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bound credential wholesale.
    pub fn install(&self, credential: String) {
        *self.slot.write() = Some(credential);
    }

    /// Drop the bound credential.
    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// The most recently bound credential, if any.
    pub fn current(&self) -> Option<String> {
        self.slot.read().clone()
    }
}
