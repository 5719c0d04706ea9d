//! Shared handler state

use std::sync::Arc;

use sz_search_core::Dispatcher;

/// Default cap on a `/search` request body: 64 MiB
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// State cloned into every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Dispatcher serving every search
    pub dispatcher: Arc<Dispatcher>,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    /// Wrap a dispatcher with the default body limit
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Override the request body limit
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}
