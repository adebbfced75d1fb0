//! Cache de vistas de carga
//!
//! Cache explícito inyectado en el orquestador, sin estado global. Guarda
//! la vista cliente de cada carga para que la UI refleje el cambio antes
//! de que termine el round-trip de red, y expone un contrato explícito de
//! invalidación por clave.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::load::Load;

/// Clave tipada del cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Vista de detalle de una carga
    LoadDetail { fleet_id: Uuid, load_id: Uuid },
    /// Listado de cargas de un fleet
    FleetLoads { fleet_id: Uuid },
}

impl CacheKey {
    pub fn detail(fleet_id: Uuid, load_id: Uuid) -> Self {
        CacheKey::LoadDetail { fleet_id, load_id }
    }

    pub fn fleet(fleet_id: Uuid) -> Self {
        CacheKey::FleetLoads { fleet_id }
    }
}

/// Contrato del cache de cargas
#[async_trait]
pub trait LoadCache: Send + Sync {
    async fn get_load(&self, key: &CacheKey) -> Option<Load>;
    async fn put_load(&self, key: CacheKey, load: Load);
    async fn invalidate(&self, key: &CacheKey);
}

/// Cache en memoria. Solo las vistas de detalle llevan valor; las claves
/// de listado participan únicamente del contrato de invalidación.
pub struct InMemoryLoadCache {
    entries: RwLock<HashMap<CacheKey, Load>>,
}

impl InMemoryLoadCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLoadCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoadCache for InMemoryLoadCache {
    async fn get_load(&self, key: &CacheKey) -> Option<Load> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(load) => {
                debug!("🔑 Load cache HIT para {:?}", key);
                Some(load.clone())
            }
            None => {
                debug!("❌ Load cache MISS para {:?}", key);
                None
            }
        }
    }

    async fn put_load(&self, key: CacheKey, load: Load) {
        let mut entries = self.entries.write().await;
        entries.insert(key, load);
    }

    async fn invalidate(&self, key: &CacheKey) {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            debug!("🗑️ Invalidada entrada de cache {:?}", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::load::{LoadStatus, Stop, StopType};
    use chrono::Utc;

    fn sample_load(fleet_id: Uuid) -> Load {
        let now = Utc::now();
        Load {
            id: Uuid::new_v4(),
            fleet_id,
            load_number: "LD-TEST-0004".to_string(),
            status: LoadStatus::Draft,
            driver_id: None,
            vehicle_id: None,
            stops: vec![
                Stop::new(StopType::Pickup, 0, now),
                Stop::new(StopType::Delivery, 1, now),
            ],
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_put_get_invalidate() {
        let cache = InMemoryLoadCache::new();
        let fleet = Uuid::new_v4();
        let load = sample_load(fleet);
        let key = CacheKey::detail(fleet, load.id);

        assert!(cache.get_load(&key).await.is_none());

        cache.put_load(key, load.clone()).await;
        assert_eq!(cache.get_load(&key).await, Some(load));

        cache.invalidate(&key).await;
        assert!(cache.get_load(&key).await.is_none());
    }
}
