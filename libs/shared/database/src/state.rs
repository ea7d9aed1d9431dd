use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StorageBackend};

use crate::memory::MemoryStore;
use crate::store::DynStore;
use crate::supabase::SupabaseStore;

/// Shared request state: configuration plus the store every cell talks to.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: DynStore,
}

impl AppState {
    pub fn new(config: AppConfig, store: DynStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let store: DynStore = match config.storage_backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Supabase => Arc::new(SupabaseStore::new(&config)),
        };
        info!("Using {} storage backend", store.backend_name());
        Self::new(config, store)
    }

    pub fn in_memory() -> Self {
        Self::new(AppConfig::default(), Arc::new(MemoryStore::new()))
    }

    /// Clamps a requested page size to the configured maximum.
    pub fn page_limit(&self, requested: Option<usize>) -> Option<usize> {
        requested.map(|limit| limit.min(self.config.max_page_size))
    }
}
