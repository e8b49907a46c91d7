use std::sync::Arc;

use crate::database::store::Store;

/// Shared application state: the injected store handle. Passed explicitly to
/// every handler instead of living in a process-global.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}
