use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StoreBackend};
use shared_database::{
    ClinicStore, InMemoryMediaStorage, InMemoryStore, MediaStorage, SupabaseMediaStorage, SupabaseStore,
};

/// Shared handler state: configuration plus the store and media backends.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ClinicStore>,
    pub media: Arc<dyn MediaStorage>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ClinicStore>, media: Arc<dyn MediaStorage>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            media,
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, Arc::new(InMemoryStore::new()), Arc::new(InMemoryMediaStorage::new()))
    }

    pub fn from_config(config: AppConfig) -> Self {
        match config.store_backend {
            StoreBackend::Supabase => {
                info!("Using Supabase store at {}", config.supabase_url);
                let store = Arc::new(SupabaseStore::new(&config));
                let media = Arc::new(SupabaseMediaStorage::new(&config));
                Self::new(config, store, media)
            }
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Self::in_memory(config)
            }
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.config.session_ttl_days)
    }
}
