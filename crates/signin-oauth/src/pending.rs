//! Single-slot record of the sign-in attempt currently in flight.
//!
//! The slot is written right before the interactive prompt and read by the
//! code exchange once the redirect comes back. A new attempt overwrites the
//! previous one; nothing ever clears it.
//!
//! Concurrent attempts are not coordinated: starting a second sign-in before
//! the first one finishes invalidates the first one's exchange. Callers
//! serialize attempts (e.g. by disabling the trigger while loading).

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::config::DiscoveryDocument;

/// Everything the code exchange needs from the request that was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchangeState {
    pub client_id: String,
    pub redirect_uri: String,
    pub discovery: DiscoveryDocument,
    pub code_verifier: String,
    pub csrf_state: String,
}

/// Holder for at most one [`PendingExchangeState`].
#[derive(Debug, Default)]
pub struct PendingSlot {
    inner: Mutex<Option<PendingExchangeState>>,
}

/// Pending slot shared between the initiator and the exchanger.
pub type SharedPendingSlot = Arc<PendingSlot>;

impl PendingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a standalone shared slot.
    pub fn shared() -> SharedPendingSlot {
        Arc::new(Self::new())
    }

    /// The process-wide slot.
    pub fn global() -> SharedPendingSlot {
        static GLOBAL: OnceLock<SharedPendingSlot> = OnceLock::new();
        GLOBAL.get_or_init(PendingSlot::shared).clone()
    }

    /// Replace the pending state, returning the attempt it superseded.
    pub fn store(&self, state: PendingExchangeState) -> Option<PendingExchangeState> {
        let previous = self.inner.lock().replace(state);
        if previous.is_some() {
            tracing::debug!("Superseding previous pending sign-in attempt");
        }
        previous
    }

    /// Snapshot of the pending state.
    pub fn get(&self) -> Option<PendingExchangeState> {
        self.inner.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.lock().is_some()
    }
}
