//! # Telemetry Module
//!
//! Shared store for the last-known lander state.
//!
//! The control exchange is the only writer; the status check and the
//! dashboard publisher read snapshots. Each decoded datagram is merged under
//! one write lock, so no reader ever sees half of a message applied.

use std::sync::{Arc, PoisonError, RwLock};

use crate::protocol::types::{TelemetryState, TelemetryUpdate};

/// Cloneable handle to the shared [`TelemetryState`]
#[derive(Debug, Clone, Default)]
pub struct TelemetryStore {
    state: Arc<RwLock<TelemetryState>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an update atomically. Returns false if the update carried no fields.
    pub fn apply(&self, update: &TelemetryUpdate) -> bool {
        if update.is_empty() {
            return false;
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.apply(update);
        true
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> TelemetryState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Back to the conservative initial state (new session)
    pub fn reset(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = TelemetryState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decoder::decode_telemetry;
    use std::thread;

    #[test]
    fn test_new_store_holds_default_state() {
        let store = TelemetryStore::new();
        assert_eq!(store.snapshot(), TelemetryState::default());
    }

    #[test]
    fn test_apply_merges_fields() {
        let store = TelemetryStore::new();
        assert!(store.apply(&decode_telemetry(b"altitude:45\nfuel:80\n")));
        assert!(store.apply(&decode_telemetry(b"fuel:79\n")));

        let state = store.snapshot();
        assert_eq!(state.altitude, 45.0);
        assert_eq!(state.fuel, 79.0);
    }

    #[test]
    fn test_empty_update_is_not_applied() {
        let store = TelemetryStore::new();
        assert!(!store.apply(&decode_telemetry(b"garbage\n")));
        assert_eq!(store.snapshot(), TelemetryState::default());
    }

    #[test]
    fn test_clones_share_state() {
        let store = TelemetryStore::new();
        let reader = store.clone();
        store.apply(&decode_telemetry(b"crashed:1\n"));
        assert!(reader.snapshot().crashed);
    }

    #[test]
    fn test_reset_restores_default() {
        let store = TelemetryStore::new();
        store.apply(&decode_telemetry(b"flying:0\naltitude:3\n"));
        store.reset();
        assert_eq!(store.snapshot(), TelemetryState::default());
    }

    #[test]
    fn test_readers_never_see_partial_message() {
        let store = TelemetryStore::new();
        let writer = store.clone();

        // Every message moves vx and vy together; a torn read would split them.
        let handle = thread::spawn(move || {
            for i in 0..2000 {
                let msg = format!("Vx:{i}\nVy:{i}\n");
                writer.apply(&decode_telemetry(msg.as_bytes()));
            }
        });

        for _ in 0..2000 {
            let state = store.snapshot();
            assert_eq!(state.vx, state.vy);
        }

        handle.join().unwrap();
    }
}
