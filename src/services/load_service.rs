//! Servicio de cargas
//!
//! Creación y lecturas. Una carga nace en DRAFT o UNASSIGNED por acción
//! de dispatcher; todo cambio de estado posterior fluye exclusivamente
//! por los motores de transición vía el orquestador. Las cargas nunca se
//! borran: cancelar es un estado, no un delete.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::lifecycle::assert_dispatcher_action_allowed;
use crate::models::actor::ActorClaims;
use crate::models::event::{EventPayload, LoadEvent};
use crate::models::load::{Load, LoadStatus, Stop, StopType};
use crate::repositories::LoadRepository;
use crate::utils::errors::{invalid_payload_error, AppResult};
use crate::utils::ids::generate_load_number;

/// Parada de una carga nueva; la secuencia la asigna el servicio en
/// orden de llegada
#[derive(Debug, Clone, Deserialize)]
pub struct NewStop {
    #[serde(rename = "type")]
    pub stop_type: StopType,
    pub scheduled_time: DateTime<Utc>,
}

/// Parámetros de creación de carga
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLoadParams {
    /// DRAFT o UNASSIGNED; cualquier otro estado inicial es inválido
    pub initial_status: LoadStatus,
    pub stops: Vec<NewStop>,
    pub notes: Option<String>,
}

/// Servicio de creación y lectura de cargas
pub struct LoadService {
    repo: Arc<dyn LoadRepository>,
}

impl LoadService {
    pub fn new(repo: Arc<dyn LoadRepository>) -> Self {
        Self { repo }
    }

    /// Crea una carga y su evento LOAD_CREATED atómicamente
    pub async fn create_load(
        &self,
        claims: &ActorClaims,
        params: CreateLoadParams,
    ) -> AppResult<Load> {
        assert_dispatcher_action_allowed(&claims.roles)?;

        if params.initial_status != LoadStatus::Draft
            && params.initial_status != LoadStatus::Unassigned
        {
            return Err(invalid_payload_error(
                "A load can only be created in DRAFT or UNASSIGNED status",
            ));
        }

        let has_pickup = params.stops.iter().any(|s| s.stop_type == StopType::Pickup);
        let has_delivery = params
            .stops
            .iter()
            .any(|s| s.stop_type == StopType::Delivery);
        if !has_pickup || !has_delivery {
            return Err(invalid_payload_error(
                "A load requires at least one PICKUP and one DELIVERY stop",
            ));
        }

        let now = Utc::now();
        let stops: Vec<Stop> = params
            .stops
            .into_iter()
            .enumerate()
            .map(|(index, stop)| Stop::new(stop.stop_type, index as u32, stop.scheduled_time))
            .collect();

        let load = Load {
            id: Uuid::new_v4(),
            fleet_id: claims.fleet_id,
            load_number: generate_load_number(),
            status: params.initial_status,
            driver_id: None,
            vehicle_id: None,
            stops,
            notes: params.notes,
            created_at: now,
            updated_at: now,
        };

        let event = LoadEvent::new(
            claims.fleet_id,
            load.id,
            &claims.uid,
            EventPayload::LoadCreated {
                status: load.status,
                load_number: load.load_number.clone(),
            },
            now,
        );

        let created = self.repo.insert(load, event).await?;
        info!(
            "📦 Carga {} creada en {} por {}",
            created.load_number, created.status, claims.uid
        );
        Ok(created)
    }

    pub async fn get_load(&self, claims: &ActorClaims, load_id: Uuid) -> AppResult<Load> {
        self.repo.get_by_id(claims.fleet_id, load_id).await
    }

    pub async fn list_loads(
        &self,
        claims: &ActorClaims,
        status: Option<LoadStatus>,
    ) -> AppResult<Vec<Load>> {
        self.repo.list_by_fleet(claims.fleet_id, status).await
    }

    pub async fn list_events(
        &self,
        claims: &ActorClaims,
        load_id: Uuid,
    ) -> AppResult<Vec<LoadEvent>> {
        self.repo.list_events(claims.fleet_id, load_id).await
    }
}
