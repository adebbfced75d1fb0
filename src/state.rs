//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::cache::{InMemoryLoadCache, LoadCache};
use crate::config::environment::EnvironmentConfig;
use crate::repositories::{FleetLookup, InMemoryFleetLookup, InMemoryLoadRepository, LoadRepository};
use crate::services::{ActionOrchestrator, LoadService};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub repo: Arc<dyn LoadRepository>,
    pub lookup: Arc<dyn FleetLookup>,
    pub cache: Arc<dyn LoadCache>,
    pub orchestrator: Arc<ActionOrchestrator>,
    pub loads: Arc<LoadService>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        repo: Arc<dyn LoadRepository>,
        lookup: Arc<dyn FleetLookup>,
        cache: Arc<dyn LoadCache>,
    ) -> Self {
        let orchestrator = Arc::new(
            ActionOrchestrator::new(Arc::clone(&repo), Arc::clone(&lookup), Arc::clone(&cache))
                .with_retry_policy(config.retry_policy()),
        );
        let loads = Arc::new(LoadService::new(Arc::clone(&repo)));

        Self {
            config,
            repo,
            lookup,
            cache,
            orchestrator,
            loads,
        }
    }

    /// Estado con las implementaciones en memoria que reemplazan al
    /// almacén de documentos remoto en desarrollo
    pub fn with_in_memory_store(config: EnvironmentConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryLoadRepository::new()),
            Arc::new(InMemoryFleetLookup::new()),
            Arc::new(InMemoryLoadCache::new()),
        )
    }
}
