//! Repositorio de cargas
//!
//! Contrato con el almacén externo. La escritura atómica aplica la
//! mutación de la carga y el append del evento como una sola unidad:
//! o ambos persisten o ninguno. La exclusión entre escritores
//! concurrentes se delega a esta escritura, no a locks del proceso.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::event::LoadEvent;
use crate::models::load::{Load, LoadStatus};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

/// Contrato del repositorio de cargas.
///
/// `get_by_id` trata el mismatch de fleet igual que un documento
/// inexistente, para no filtrar existencia entre tenants. Los eventos
/// son append-only: no hay update ni delete sobre ellos.
#[async_trait]
pub trait LoadRepository: Send + Sync {
    /// Lee la carga autoritativa por id, limitada al fleet del actor
    async fn get_by_id(&self, fleet_id: Uuid, load_id: Uuid) -> AppResult<Load>;

    /// Crea la carga junto con su evento de creación, atómicamente
    async fn insert(&self, load: Load, event: LoadEvent) -> AppResult<Load>;

    /// Aplica la mutación y agrega el evento como una sola unidad.
    ///
    /// `expected_updated_at` es la versión leída por el caller; si el
    /// documento cambió desde esa lectura la escritura se rechaza con
    /// `Conflict` y nada se persiste.
    async fn atomic_update(
        &self,
        load_id: Uuid,
        expected_updated_at: DateTime<Utc>,
        updated: Load,
        event: LoadEvent,
    ) -> AppResult<Load>;

    /// Lista cargas del fleet, opcionalmente filtradas por estado
    async fn list_by_fleet(
        &self,
        fleet_id: Uuid,
        status: Option<LoadStatus>,
    ) -> AppResult<Vec<Load>>;

    /// Stream de eventos de una carga, ordenado por `created_at` con
    /// el orden de inserción como desempate
    async fn list_events(&self, fleet_id: Uuid, load_id: Uuid) -> AppResult<Vec<LoadEvent>>;
}

#[derive(Default)]
struct StoreInner {
    loads: HashMap<Uuid, Load>,
    events: HashMap<Uuid, Vec<LoadEvent>>,
}

/// Invariante del modelo: un evento siempre describe la carga que acompaña
fn check_event_scope(load: &Load, event: &LoadEvent) -> AppResult<()> {
    if event.load_id != load.id || event.fleet_id != load.fleet_id {
        return Err(AppError::Internal(format!(
            "Event {} does not describe load {}",
            event.id, load.id
        )));
    }
    Ok(())
}

/// Implementación en memoria del repositorio.
///
/// Reemplaza al almacén de documentos remoto en desarrollo y en tests.
/// Un único lock de escritura cubre cargas y eventos, de modo que la
/// escritura atómica lo es de verdad.
pub struct InMemoryLoadRepository {
    inner: RwLock<StoreInner>,
}

impl InMemoryLoadRepository {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
        }
    }
}

impl Default for InMemoryLoadRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoadRepository for InMemoryLoadRepository {
    async fn get_by_id(&self, fleet_id: Uuid, load_id: Uuid) -> AppResult<Load> {
        let inner = self.inner.read().await;
        match inner.loads.get(&load_id) {
            Some(load) if load.fleet_id == fleet_id => Ok(load.clone()),
            // Fleet mismatch se reporta igual que inexistente
            _ => Err(not_found_error("Load", &load_id.to_string())),
        }
    }

    async fn insert(&self, load: Load, event: LoadEvent) -> AppResult<Load> {
        check_event_scope(&load, &event)?;

        let mut inner = self.inner.write().await;
        if inner.loads.contains_key(&load.id) {
            return Err(AppError::Conflict(format!(
                "Load with id '{}' already exists",
                load.id
            )));
        }

        inner.events.entry(load.id).or_default().push(event);
        inner.loads.insert(load.id, load.clone());
        Ok(load)
    }

    async fn atomic_update(
        &self,
        load_id: Uuid,
        expected_updated_at: DateTime<Utc>,
        updated: Load,
        event: LoadEvent,
    ) -> AppResult<Load> {
        check_event_scope(&updated, &event)?;

        let mut inner = self.inner.write().await;

        let stored = inner
            .loads
            .get(&load_id)
            .ok_or_else(|| not_found_error("Load", &load_id.to_string()))?;

        if stored.updated_at != expected_updated_at {
            return Err(conflict_error("Load", &load_id.to_string()));
        }

        inner.events.entry(load_id).or_default().push(event);
        inner.loads.insert(load_id, updated.clone());
        Ok(updated)
    }

    async fn list_by_fleet(
        &self,
        fleet_id: Uuid,
        status: Option<LoadStatus>,
    ) -> AppResult<Vec<Load>> {
        let inner = self.inner.read().await;
        let mut loads: Vec<Load> = inner
            .loads
            .values()
            .filter(|load| load.fleet_id == fleet_id)
            .filter(|load| status.map_or(true, |s| load.status == s))
            .cloned()
            .collect();
        loads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(loads)
    }

    async fn list_events(&self, fleet_id: Uuid, load_id: Uuid) -> AppResult<Vec<LoadEvent>> {
        let inner = self.inner.read().await;

        match inner.loads.get(&load_id) {
            Some(load) if load.fleet_id == fleet_id => {}
            _ => return Err(not_found_error("Load", &load_id.to_string())),
        }

        let mut events = inner.events.get(&load_id).cloned().unwrap_or_default();
        // sort estable: empates de created_at conservan orden de inserción
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventPayload;
    use crate::models::load::{Stop, StopType};

    fn sample_load(fleet_id: Uuid) -> Load {
        let now = Utc::now();
        Load {
            id: Uuid::new_v4(),
            fleet_id,
            load_number: "LD-TEST-0003".to_string(),
            status: LoadStatus::Unassigned,
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

    fn created_event(load: &Load) -> LoadEvent {
        LoadEvent::new(
            load.fleet_id,
            load.id,
            "dispatcher_1",
            EventPayload::LoadCreated {
                status: load.status,
                load_number: load.load_number.clone(),
            },
            load.created_at,
        )
    }

    #[tokio::test]
    async fn test_fleet_mismatch_reads_as_not_found() {
        let repo = InMemoryLoadRepository::new();
        let fleet = Uuid::new_v4();
        let load = sample_load(fleet);
        let event = created_event(&load);
        repo.insert(load.clone(), event).await.unwrap();

        assert!(repo.get_by_id(fleet, load.id).await.is_ok());

        let other_fleet = Uuid::new_v4();
        let result = repo.get_by_id(other_fleet, load.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_atomic_update_rejects_stale_version() {
        let repo = InMemoryLoadRepository::new();
        let fleet = Uuid::new_v4();
        let load = sample_load(fleet);
        repo.insert(load.clone(), created_event(&load)).await.unwrap();

        let stale_version = load.updated_at - chrono::Duration::seconds(5);
        let mut updated = load.clone();
        updated.status = LoadStatus::Cancelled;
        updated.updated_at = Utc::now();

        let event = LoadEvent::new(
            fleet,
            load.id,
            "dispatcher_1",
            EventPayload::LoadCancelled {
                previous_status: LoadStatus::Unassigned,
                new_status: LoadStatus::Cancelled,
                reason: "No reason provided".to_string(),
            },
            Utc::now(),
        );

        let result = repo
            .atomic_update(load.id, stale_version, updated, event)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        // Nada se persistió: ni la mutación ni el evento
        let stored = repo.get_by_id(fleet, load.id).await.unwrap();
        assert_eq!(stored.status, LoadStatus::Unassigned);
        let events = repo.list_events(fleet, load.id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn test_list_by_fleet_filters_by_status() {
        let repo = InMemoryLoadRepository::new();
        let fleet = Uuid::new_v4();

        let unassigned = sample_load(fleet);
        repo.insert(unassigned.clone(), created_event(&unassigned))
            .await
            .unwrap();

        let mut cancelled = sample_load(fleet);
        cancelled.status = LoadStatus::Cancelled;
        repo.insert(cancelled.clone(), created_event(&cancelled))
            .await
            .unwrap();

        let all = repo.list_by_fleet(fleet, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_cancelled = repo
            .list_by_fleet(fleet, Some(LoadStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(only_cancelled.len(), 1);
        assert_eq!(only_cancelled[0].id, cancelled.id);
    }
}
