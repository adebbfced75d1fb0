//! Motor de transiciones de driver
//!
//! Computa el siguiente estado para las acciones de campo del driver
//! (llegar, salir, entregar). Función pura y síncrona: valida el estado
//! actual, decide la transición y devuelve el resultado sin efectos
//! secundarios. El guard de ownership corre antes de computar o persistir.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::event::EventPayload;
use crate::models::load::{Load, LoadStatus, StopType};
use crate::models::transition::{AssignmentChange, DriverAction, StopUpdate, TransitionResult};
use crate::utils::errors::{AppError, AppResult};

/// Verifica que el driver actuante es el asignado a la carga.
///
/// Falla con `Unauthorized` si no hay identidad de driver en los claims,
/// y con `Forbidden` si la carga está asignada a otro driver.
pub fn assert_driver_action_allowed(load: &Load, acting_driver_id: Option<Uuid>) -> AppResult<()> {
    let driver_id = acting_driver_id
        .ok_or_else(|| AppError::Unauthorized("Driver identity not found in claims".to_string()))?;

    if load.driver_id != Some(driver_id) {
        return Err(AppError::Forbidden(format!(
            "Load {} is not assigned to driver {}",
            load.id, driver_id
        )));
    }

    Ok(())
}

/// Computa la transición para una acción de driver.
///
/// El mensaje de `IllegalTransition` nombra la acción intentada y el
/// estado real, para diagnóstico de cara al usuario. `MissingStop` indica
/// datos de carga malformados y se distingue de los errores de usuario.
pub fn compute_driver_transition(
    load: &Load,
    action: DriverAction,
    now: DateTime<Utc>,
) -> AppResult<TransitionResult> {
    let current_status = load.status;

    match action {
        DriverAction::ArrivePickup => {
            if current_status != LoadStatus::Assigned {
                return Err(illegal_driver_transition(action, current_status));
            }
            Ok(TransitionResult {
                next_status: LoadStatus::AtPickup,
                assignment: AssignmentChange::Keep,
                stop_updates: vec![],
                event_payload: EventPayload::StatusChanged {
                    previous_status: current_status,
                    new_status: LoadStatus::AtPickup,
                },
            })
        }

        DriverAction::DepartPickup => {
            if current_status != LoadStatus::AtPickup {
                return Err(illegal_driver_transition(action, current_status));
            }
            complete_first_stop(load, StopType::Pickup, LoadStatus::InTransit, now)
        }

        DriverAction::ArriveDelivery => {
            if current_status != LoadStatus::InTransit {
                return Err(illegal_driver_transition(action, current_status));
            }
            Ok(TransitionResult {
                next_status: LoadStatus::AtDelivery,
                assignment: AssignmentChange::Keep,
                stop_updates: vec![],
                event_payload: EventPayload::StatusChanged {
                    previous_status: current_status,
                    new_status: LoadStatus::AtDelivery,
                },
            })
        }

        DriverAction::MarkDelivered => {
            if current_status != LoadStatus::AtDelivery {
                return Err(illegal_driver_transition(action, current_status));
            }
            complete_first_stop(load, StopType::Delivery, LoadStatus::Delivered, now)
        }
    }
}

/// Marca completada la primera parada del tipo esperado
fn complete_first_stop(
    load: &Load,
    stop_type: StopType,
    next_status: LoadStatus,
    now: DateTime<Utc>,
) -> AppResult<TransitionResult> {
    let index = load.first_stop_index(stop_type).ok_or_else(|| {
        AppError::MissingStop(format!(
            "Load {} has no stop of type {}",
            load.id, stop_type
        ))
    })?;

    Ok(TransitionResult {
        next_status,
        assignment: AssignmentChange::Keep,
        stop_updates: vec![StopUpdate {
            index,
            actual_time: now,
            is_completed: true,
        }],
        event_payload: EventPayload::StopCompleted {
            previous_status: load.status,
            new_status: next_status,
            stop_sequence: load.stops[index].sequence,
            stop_type,
            actual_time: now,
        },
    })
}

fn illegal_driver_transition(action: DriverAction, status: LoadStatus) -> AppError {
    AppError::IllegalTransition(format!("Cannot apply {} from status {}", action, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::load::Stop;

    fn load_with_status(status: LoadStatus, driver_id: Option<Uuid>) -> Load {
        let now = Utc::now();
        Load {
            id: Uuid::new_v4(),
            fleet_id: Uuid::new_v4(),
            load_number: "LD-TEST-0001".to_string(),
            status,
            driver_id,
            vehicle_id: driver_id.map(|_| Uuid::new_v4()),
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
    fn test_each_action_requires_exact_status() {
        let driver_id = Some(Uuid::new_v4());
        let cases = [
            (DriverAction::ArrivePickup, LoadStatus::Assigned),
            (DriverAction::DepartPickup, LoadStatus::AtPickup),
            (DriverAction::ArriveDelivery, LoadStatus::InTransit),
            (DriverAction::MarkDelivered, LoadStatus::AtDelivery),
        ];
        let all_statuses = [
            LoadStatus::Draft,
            LoadStatus::Unassigned,
            LoadStatus::Assigned,
            LoadStatus::AtPickup,
            LoadStatus::InTransit,
            LoadStatus::AtDelivery,
            LoadStatus::Delivered,
            LoadStatus::Cancelled,
        ];

        for (action, required) in cases {
            for status in all_statuses {
                let load = load_with_status(status, driver_id);
                let result = compute_driver_transition(&load, action, Utc::now());
                if status == required {
                    assert!(result.is_ok(), "{} should succeed from {}", action, status);
                } else {
                    match result {
                        Err(AppError::IllegalTransition(msg)) => {
                            assert!(msg.contains(action.as_str()));
                            assert!(msg.contains(status.as_str()));
                        }
                        other => panic!("{} from {} should fail, got {:?}", action, status, other),
                    }
                }
            }
        }
    }

    #[test]
    fn test_arrive_pickup_changes_status_only() {
        let load = load_with_status(LoadStatus::Assigned, Some(Uuid::new_v4()));
        let result = compute_driver_transition(&load, DriverAction::ArrivePickup, Utc::now())
            .expect("legal transition");

        assert_eq!(result.next_status, LoadStatus::AtPickup);
        assert!(result.stop_updates.is_empty());
        assert_eq!(
            result.event_payload,
            EventPayload::StatusChanged {
                previous_status: LoadStatus::Assigned,
                new_status: LoadStatus::AtPickup,
            }
        );
    }

    #[test]
    fn test_depart_pickup_completes_first_pickup_stop() {
        let load = load_with_status(LoadStatus::AtPickup, Some(Uuid::new_v4()));
        let now = Utc::now();
        let result = compute_driver_transition(&load, DriverAction::DepartPickup, now)
            .expect("legal transition");

        assert_eq!(result.next_status, LoadStatus::InTransit);
        assert_eq!(result.stop_updates.len(), 1);
        assert_eq!(result.stop_updates[0].index, 0);
        assert_eq!(result.stop_updates[0].actual_time, now);
        assert!(result.stop_updates[0].is_completed);
        match result.event_payload {
            EventPayload::StopCompleted {
                stop_type,
                actual_time,
                ..
            } => {
                assert_eq!(stop_type, StopType::Pickup);
                assert_eq!(actual_time, now);
            }
            other => panic!("expected StopCompleted, got {:?}", other),
        }
    }

    #[test]
    fn test_mark_delivered_completes_first_delivery_stop() {
        let load = load_with_status(LoadStatus::AtDelivery, Some(Uuid::new_v4()));
        let now = Utc::now();
        let result = compute_driver_transition(&load, DriverAction::MarkDelivered, now)
            .expect("legal transition");

        assert_eq!(result.next_status, LoadStatus::Delivered);
        assert_eq!(result.stop_updates.len(), 1);
        assert_eq!(result.stop_updates[0].index, 1);
    }

    #[test]
    fn test_missing_stop_is_distinct_from_illegal_transition() {
        let mut load = load_with_status(LoadStatus::AtPickup, Some(Uuid::new_v4()));
        load.stops.retain(|s| s.stop_type != StopType::Pickup);

        let result = compute_driver_transition(&load, DriverAction::DepartPickup, Utc::now());
        assert!(matches!(result, Err(AppError::MissingStop(_))));
    }

    #[test]
    fn test_guard_rejects_other_driver() {
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let load = load_with_status(LoadStatus::Assigned, Some(owner));

        assert!(assert_driver_action_allowed(&load, Some(owner)).is_ok());
        assert!(matches!(
            assert_driver_action_allowed(&load, Some(intruder)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            assert_driver_action_allowed(&load, None),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_guard_rejects_unassigned_load() {
        let load = load_with_status(LoadStatus::Unassigned, None);
        let result = assert_driver_action_allowed(&load, Some(Uuid::new_v4()));
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
