// libs/scheduling-cell/src/state.rs
use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::booking::BookingService;
use crate::store::BookingStore;

/// Shared state handed to the scheduling routes: the configuration plus the
/// booking store backend chosen at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn BookingStore>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn BookingStore>) -> Self {
        Self { config, store }
    }

    pub fn booking_service(&self) -> BookingService {
        BookingService::new(&self.config, Arc::clone(&self.store))
    }
}
