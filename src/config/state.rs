// Application state module
// Shared between the accept loop and every connection task

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::types::Config;
use crate::storage::LogStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: LogStore,
    pub active_connections: Arc<AtomicUsize>,

    /// Raised by a handler when a fault must stop the server (`exit` policy)
    pub fatal_signal: Arc<Notify>,
    fatal_reason: Mutex<Option<String>>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            store: LogStore::from_config(&config.storage),
            config: config.clone(),
            active_connections: Arc::new(AtomicUsize::new(0)),
            fatal_signal: Arc::new(Notify::new()),
            fatal_reason: Mutex::new(None),
        }
    }

    /// Record the first fatal fault and wake the accept loop
    pub fn raise_fatal(&self, reason: String) {
        if let Ok(mut slot) = self.fatal_reason.lock() {
            if slot.is_none() {
                *slot = Some(reason);
            }
        }
        // notify_one stores a permit if the loop is not waiting yet
        self.fatal_signal.notify_one();
    }

    pub fn fatal_reason(&self) -> Option<String> {
        self.fatal_reason.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }
}
