//! Modelo de Event
//!
//! Registros de auditoría inmutables y append-only. Un evento nunca se
//! modifica ni se borra una vez creado. El payload es una unión etiquetada
//! por tipo de evento: cada variante lleva solo los campos que ese tipo
//! necesita, con chequeo de exhaustividad en compilación.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::load::{LoadStatus, StopType};

/// Vocabulario cerrado de tipos de evento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    LoadCreated,
    LoadAssigned,
    LoadReassigned,
    LoadUnassigned,
    LoadCancelled,
    LoadReactivated,
    StatusChanged,
    StopCompleted,
    DocumentUploaded,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::LoadCreated => "LOAD_CREATED",
            EventType::LoadAssigned => "LOAD_ASSIGNED",
            EventType::LoadReassigned => "LOAD_REASSIGNED",
            EventType::LoadUnassigned => "LOAD_UNASSIGNED",
            EventType::LoadCancelled => "LOAD_CANCELLED",
            EventType::LoadReactivated => "LOAD_REACTIVATED",
            EventType::StatusChanged => "STATUS_CHANGED",
            EventType::StopCompleted => "STOP_COMPLETED",
            EventType::DocumentUploaded => "DOCUMENT_UPLOADED",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload del evento, una variante por tipo de evento
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    LoadCreated {
        status: LoadStatus,
        load_number: String,
    },
    LoadAssigned {
        previous_status: LoadStatus,
        new_status: LoadStatus,
        driver_id: Uuid,
        vehicle_id: Uuid,
    },
    LoadReassigned {
        previous_status: LoadStatus,
        new_status: LoadStatus,
        driver_id: Uuid,
        vehicle_id: Uuid,
        previous_driver_id: Option<Uuid>,
        previous_vehicle_id: Option<Uuid>,
    },
    LoadUnassigned {
        previous_status: LoadStatus,
        new_status: LoadStatus,
        previous_driver_id: Option<Uuid>,
        previous_vehicle_id: Option<Uuid>,
    },
    LoadCancelled {
        previous_status: LoadStatus,
        new_status: LoadStatus,
        reason: String,
    },
    LoadReactivated {
        previous_status: LoadStatus,
        new_status: LoadStatus,
    },
    StatusChanged {
        previous_status: LoadStatus,
        new_status: LoadStatus,
    },
    StopCompleted {
        previous_status: LoadStatus,
        new_status: LoadStatus,
        stop_sequence: u32,
        stop_type: StopType,
        actual_time: DateTime<Utc>,
    },
    DocumentUploaded {
        document_id: Uuid,
        document_type: String,
    },
}

impl EventPayload {
    /// Tipo de evento que corresponde a este payload
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::LoadCreated { .. } => EventType::LoadCreated,
            EventPayload::LoadAssigned { .. } => EventType::LoadAssigned,
            EventPayload::LoadReassigned { .. } => EventType::LoadReassigned,
            EventPayload::LoadUnassigned { .. } => EventType::LoadUnassigned,
            EventPayload::LoadCancelled { .. } => EventType::LoadCancelled,
            EventPayload::LoadReactivated { .. } => EventType::LoadReactivated,
            EventPayload::StatusChanged { .. } => EventType::StatusChanged,
            EventPayload::StopCompleted { .. } => EventType::StopCompleted,
            EventPayload::DocumentUploaded { .. } => EventType::DocumentUploaded,
        }
    }
}

/// Evento de auditoría de una carga
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadEvent {
    pub id: Uuid,
    pub fleet_id: Uuid,
    pub load_id: Uuid,
    pub event_type: EventType,
    pub actor_uid: String,
    pub created_at: DateTime<Utc>,
    pub payload: EventPayload,
}

impl LoadEvent {
    pub fn new(
        fleet_id: Uuid,
        load_id: Uuid,
        actor_uid: &str,
        payload: EventPayload,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            fleet_id,
            load_id,
            event_type: payload.event_type(),
            actor_uid: actor_uid.to_string(),
            created_at,
            payload,
        }
    }
}
