//! Resultado de transición
//!
//! Tipos compartidos por los dos motores de transición: las acciones de
//! driver y dispatcher, el cambio de asignación y el `TransitionResult`
//! que los motores devuelven. Los motores solo computan; aplicar el
//! resultado y persistirlo es trabajo del orquestador.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::{EventPayload, EventType};
use super::load::{Load, LoadStatus};

/// Acciones de driver en campo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverAction {
    ArrivePickup,
    DepartPickup,
    ArriveDelivery,
    MarkDelivered,
}

impl DriverAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverAction::ArrivePickup => "ARRIVE_PICKUP",
            DriverAction::DepartPickup => "DEPART_PICKUP",
            DriverAction::ArriveDelivery => "ARRIVE_DELIVERY",
            DriverAction::MarkDelivered => "MARK_DELIVERED",
        }
    }
}

impl std::fmt::Display for DriverAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acciones de dispatcher de back-office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatcherAction {
    Assign,
    Reassign,
    Unassign,
    Cancel,
    Reactivate,
}

impl DispatcherAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatcherAction::Assign => "ASSIGN",
            DispatcherAction::Reassign => "REASSIGN",
            DispatcherAction::Unassign => "UNASSIGN",
            DispatcherAction::Cancel => "CANCEL",
            DispatcherAction::Reactivate => "REACTIVATE",
        }
    }
}

impl std::fmt::Display for DispatcherAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Datos de asignación para ASSIGN / REASSIGN. Ambos campos son
/// obligatorios; un payload parcial nunca llega a construir este tipo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssignmentData {
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
}

/// Cambio de asignación derivado de una transición
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AssignmentChange {
    /// Mantener driver y vehículo actuales
    Keep,
    /// Asignar (o reemplazar) driver y vehículo
    Set {
        driver_id: Uuid,
        vehicle_id: Uuid,
    },
    /// Limpiar driver y vehículo a null
    Clear,
}

/// Actualización de una parada completada por una transición de driver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopUpdate {
    pub index: usize,
    pub actual_time: DateTime<Utc>,
    pub is_completed: bool,
}

/// Resultado de una transición computada: siguiente estado, mutaciones de
/// campos y el descriptor del evento de auditoría. Computar no tiene
/// efectos secundarios.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub next_status: LoadStatus,
    pub assignment: AssignmentChange,
    pub stop_updates: Vec<StopUpdate>,
    pub event_payload: EventPayload,
}

impl TransitionResult {
    pub fn event_type(&self) -> EventType {
        self.event_payload.event_type()
    }

    /// Aplica la mutación a una copia de la carga. `updated_at` avanza
    /// siempre; las paradas no tocadas quedan intactas.
    pub fn apply_to(&self, load: &Load, now: DateTime<Utc>) -> Load {
        let mut updated = load.clone();
        updated.status = self.next_status;

        match self.assignment {
            AssignmentChange::Keep => {}
            AssignmentChange::Set {
                driver_id,
                vehicle_id,
            } => {
                updated.driver_id = Some(driver_id);
                updated.vehicle_id = Some(vehicle_id);
            }
            AssignmentChange::Clear => {
                updated.driver_id = None;
                updated.vehicle_id = None;
            }
        }

        for stop_update in &self.stop_updates {
            if let Some(stop) = updated.stops.get_mut(stop_update.index) {
                stop.actual_time = Some(stop_update.actual_time);
                stop.is_completed = stop_update.is_completed;
            }
        }

        updated.updated_at = now;
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::load::{Stop, StopType};

    fn sample_load(status: LoadStatus) -> Load {
        let now = Utc::now();
        Load {
            id: Uuid::new_v4(),
            fleet_id: Uuid::new_v4(),
            load_number: "LD-TEST-0001".to_string(),
            status,
            driver_id: Some(Uuid::new_v4()),
            vehicle_id: Some(Uuid::new_v4()),
            stops: vec![
                Stop::new(StopType::Pickup, 0, now),
                Stop::new(StopType::Delivery, 1, now),
            ],
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_apply_clear_assignment() {
        let load = sample_load(LoadStatus::Assigned);
        let result = TransitionResult {
            next_status: LoadStatus::Unassigned,
            assignment: AssignmentChange::Clear,
            stop_updates: vec![],
            event_payload: EventPayload::LoadUnassigned {
                previous_status: LoadStatus::Assigned,
                new_status: LoadStatus::Unassigned,
                previous_driver_id: load.driver_id,
                previous_vehicle_id: load.vehicle_id,
            },
        };

        let updated = result.apply_to(&load, Utc::now());
        assert_eq!(updated.status, LoadStatus::Unassigned);
        assert_eq!(updated.driver_id, None);
        assert_eq!(updated.vehicle_id, None);
        // La carga original no se toca
        assert!(load.driver_id.is_some());
    }

    #[test]
    fn test_apply_stop_update_touches_only_target_stop() {
        let load = sample_load(LoadStatus::AtPickup);
        let completion_time = Utc::now();
        let result = TransitionResult {
            next_status: LoadStatus::InTransit,
            assignment: AssignmentChange::Keep,
            stop_updates: vec![StopUpdate {
                index: 0,
                actual_time: completion_time,
                is_completed: true,
            }],
            event_payload: EventPayload::StopCompleted {
                previous_status: LoadStatus::AtPickup,
                new_status: LoadStatus::InTransit,
                stop_sequence: 0,
                stop_type: StopType::Pickup,
                actual_time: completion_time,
            },
        };

        let updated = result.apply_to(&load, completion_time);
        assert!(updated.stops[0].is_completed);
        assert_eq!(updated.stops[0].actual_time, Some(completion_time));
        assert!(!updated.stops[1].is_completed);
        assert_eq!(updated.stops[1].actual_time, None);
        assert_eq!(updated.updated_at, completion_time);
    }
}
