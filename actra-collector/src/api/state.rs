//! Shared application state for API handlers.

use crate::diagram::DiagramService;
use crate::index::ActionStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared state passed to all handlers.
pub struct AppState {
    /// The store the diagram service queries.
    pub store: Arc<dyn ActionStore>,
    /// Diagram builder over the store.
    pub diagram: DiagramService,
    /// Server start time.
    pub start_time: Instant,
}

impl AppState {
    /// Create state over the given store.
    pub fn new(store: Arc<dyn ActionStore>) -> Self {
        Self {
            diagram: DiagramService::new(store.clone()),
            store,
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
