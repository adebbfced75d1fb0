//! Motor de transiciones de dispatcher
//!
//! Computa el siguiente estado para las acciones de back-office
//! (asignar, reasignar, desasignar, cancelar, reactivar). Se mantiene
//! separado del motor de driver: los dos tienen vocabularios de acción
//! disjuntos y modelos de autorización distintos (roles vs. ownership),
//! y unificarlos forzaría cross-checks artificiales.

use crate::models::actor::Role;
use crate::models::event::EventPayload;
use crate::models::load::{Load, LoadStatus};
use crate::models::transition::{
    AssignmentChange, AssignmentData, DispatcherAction, TransitionResult,
};
use crate::utils::errors::{AppError, AppResult};

use std::collections::BTreeSet;

/// Roles que pueden ejecutar acciones de dispatcher
pub const DISPATCH_ROLES: [Role; 3] = [Role::Dispatcher, Role::Owner, Role::Admin];

/// Verifica que el actor tiene al menos uno de los roles de dispatch.
///
/// Falla con `Unauthorized` si el actor no tiene ningún rol asignado y
/// con `Forbidden` si ninguno de sus roles está en el conjunto permitido.
pub fn assert_dispatcher_action_allowed(actor_roles: &BTreeSet<Role>) -> AppResult<()> {
    if actor_roles.is_empty() {
        return Err(AppError::Unauthorized(
            "User has no role assigned".to_string(),
        ));
    }

    if !actor_roles.iter().any(|role| DISPATCH_ROLES.contains(role)) {
        let held: Vec<&str> = actor_roles.iter().map(|r| r.as_str()).collect();
        return Err(AppError::Forbidden(format!(
            "User role \"{}\" cannot perform dispatcher actions",
            held.join(", ")
        )));
    }

    Ok(())
}

/// Computa la transición para una acción de dispatcher.
///
/// Cada rama devuelve un `TransitionResult` con la mutación de campos y
/// el payload de evento completo; REASSIGN y UNASSIGN registran los
/// valores previos de driver/vehículo para preservar la traza de
/// auditoría a través de updates destructivos.
pub fn compute_dispatcher_transition(
    load: &Load,
    action: DispatcherAction,
    assignment_data: Option<&AssignmentData>,
    reason: Option<&str>,
) -> AppResult<TransitionResult> {
    let current_status = load.status;

    match action {
        DispatcherAction::Assign => {
            if current_status != LoadStatus::Unassigned && current_status != LoadStatus::Draft {
                return Err(AppError::IllegalTransition(format!(
                    "Cannot ASSIGN from status {}. Must be UNASSIGNED or DRAFT",
                    current_status
                )));
            }
            let assignment = require_assignment(action, assignment_data)?;

            Ok(TransitionResult {
                next_status: LoadStatus::Assigned,
                assignment: AssignmentChange::Set {
                    driver_id: assignment.driver_id,
                    vehicle_id: assignment.vehicle_id,
                },
                stop_updates: vec![],
                event_payload: EventPayload::LoadAssigned {
                    previous_status: current_status,
                    new_status: LoadStatus::Assigned,
                    driver_id: assignment.driver_id,
                    vehicle_id: assignment.vehicle_id,
                },
            })
        }

        DispatcherAction::Reassign => {
            if current_status != LoadStatus::Assigned && current_status != LoadStatus::AtPickup {
                return Err(AppError::IllegalTransition(format!(
                    "Cannot REASSIGN from status {}. Must be ASSIGNED or AT_PICKUP",
                    current_status
                )));
            }
            let assignment = require_assignment(action, assignment_data)?;

            Ok(TransitionResult {
                next_status: LoadStatus::Assigned,
                assignment: AssignmentChange::Set {
                    driver_id: assignment.driver_id,
                    vehicle_id: assignment.vehicle_id,
                },
                stop_updates: vec![],
                event_payload: EventPayload::LoadReassigned {
                    previous_status: current_status,
                    new_status: LoadStatus::Assigned,
                    driver_id: assignment.driver_id,
                    vehicle_id: assignment.vehicle_id,
                    previous_driver_id: load.driver_id,
                    previous_vehicle_id: load.vehicle_id,
                },
            })
        }

        DispatcherAction::Unassign => {
            if current_status != LoadStatus::Assigned {
                return Err(AppError::IllegalTransition(format!(
                    "Cannot UNASSIGN from status {}. Must be ASSIGNED",
                    current_status
                )));
            }

            Ok(TransitionResult {
                next_status: LoadStatus::Unassigned,
                assignment: AssignmentChange::Clear,
                stop_updates: vec![],
                event_payload: EventPayload::LoadUnassigned {
                    previous_status: current_status,
                    new_status: LoadStatus::Unassigned,
                    previous_driver_id: load.driver_id,
                    previous_vehicle_id: load.vehicle_id,
                },
            })
        }

        DispatcherAction::Cancel => {
            if current_status != LoadStatus::Unassigned
                && current_status != LoadStatus::Draft
                && current_status != LoadStatus::Assigned
            {
                return Err(AppError::IllegalTransition(format!(
                    "Cannot CANCEL from status {}. Must be UNASSIGNED, DRAFT, or ASSIGNED",
                    current_status
                )));
            }

            Ok(TransitionResult {
                next_status: LoadStatus::Cancelled,
                assignment: AssignmentChange::Keep,
                stop_updates: vec![],
                event_payload: EventPayload::LoadCancelled {
                    previous_status: current_status,
                    new_status: LoadStatus::Cancelled,
                    reason: reason.unwrap_or("No reason provided").to_string(),
                },
            })
        }

        DispatcherAction::Reactivate => {
            if current_status != LoadStatus::Cancelled {
                return Err(AppError::IllegalTransition(format!(
                    "Cannot REACTIVATE from status {}. Must be CANCELLED",
                    current_status
                )));
            }

            // Reactivar fuerza re-asignación: siempre vuelve a DRAFT
            Ok(TransitionResult {
                next_status: LoadStatus::Draft,
                assignment: AssignmentChange::Keep,
                stop_updates: vec![],
                event_payload: EventPayload::LoadReactivated {
                    previous_status: current_status,
                    new_status: LoadStatus::Draft,
                },
            })
        }
    }
}

fn require_assignment<'a>(
    action: DispatcherAction,
    assignment_data: Option<&'a AssignmentData>,
) -> AppResult<&'a AssignmentData> {
    assignment_data.ok_or_else(|| {
        AppError::InvalidPayload(format!(
            "driver_id and vehicle_id are required for {} action",
            action
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::load::{Stop, StopType};
    use chrono::Utc;
    use uuid::Uuid;

    fn load_with(status: LoadStatus, driver_id: Option<Uuid>, vehicle_id: Option<Uuid>) -> Load {
        let now = Utc::now();
        Load {
            id: Uuid::new_v4(),
            fleet_id: Uuid::new_v4(),
            load_number: "LD-TEST-0002".to_string(),
            status,
            driver_id,
            vehicle_id,
            stops: vec![
                Stop::new(StopType::Pickup, 0, now),
                Stop::new(StopType::Delivery, 1, now),
            ],
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn assignment() -> AssignmentData {
        AssignmentData {
            driver_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_assign_from_unassigned_and_draft_only() {
        let data = assignment();
        for status in [LoadStatus::Unassigned, LoadStatus::Draft] {
            let load = load_with(status, None, None);
            let result =
                compute_dispatcher_transition(&load, DispatcherAction::Assign, Some(&data), None)
                    .expect("legal transition");
            assert_eq!(result.next_status, LoadStatus::Assigned);
            assert_eq!(
                result.assignment,
                AssignmentChange::Set {
                    driver_id: data.driver_id,
                    vehicle_id: data.vehicle_id,
                }
            );
        }

        let load = load_with(LoadStatus::Assigned, Some(Uuid::new_v4()), None);
        let result =
            compute_dispatcher_transition(&load, DispatcherAction::Assign, Some(&data), None);
        match result {
            Err(AppError::IllegalTransition(msg)) => {
                assert!(msg.contains("UNASSIGNED or DRAFT"));
            }
            other => panic!("expected IllegalTransition, got {:?}", other),
        }
    }

    #[test]
    fn test_assign_without_payload_is_invalid() {
        let load = load_with(LoadStatus::Unassigned, None, None);
        let result = compute_dispatcher_transition(&load, DispatcherAction::Assign, None, None);
        assert!(matches!(result, Err(AppError::InvalidPayload(_))));

        let load = load_with(LoadStatus::Assigned, Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        let result = compute_dispatcher_transition(&load, DispatcherAction::Reassign, None, None);
        assert!(matches!(result, Err(AppError::InvalidPayload(_))));
    }

    #[test]
    fn test_reassign_records_previous_assignment() {
        let previous_driver = Uuid::new_v4();
        let previous_vehicle = Uuid::new_v4();
        let data = assignment();
        let load = load_with(
            LoadStatus::AtPickup,
            Some(previous_driver),
            Some(previous_vehicle),
        );

        let result =
            compute_dispatcher_transition(&load, DispatcherAction::Reassign, Some(&data), None)
                .expect("legal transition");

        match result.event_payload {
            EventPayload::LoadReassigned {
                previous_driver_id,
                previous_vehicle_id,
                driver_id,
                vehicle_id,
                ..
            } => {
                assert_eq!(previous_driver_id, Some(previous_driver));
                assert_eq!(previous_vehicle_id, Some(previous_vehicle));
                assert_eq!(driver_id, data.driver_id);
                assert_eq!(vehicle_id, data.vehicle_id);
            }
            other => panic!("expected LoadReassigned, got {:?}", other),
        }
    }

    #[test]
    fn test_reassign_records_null_previous_assignment() {
        // Una carga puede llegar a ASSIGNED con datos incompletos; el
        // payload debe registrar los valores previos aunque sean null
        let data = assignment();
        let load = load_with(LoadStatus::Assigned, None, None);

        let result =
            compute_dispatcher_transition(&load, DispatcherAction::Reassign, Some(&data), None)
                .expect("legal transition");

        match result.event_payload {
            EventPayload::LoadReassigned {
                previous_driver_id,
                previous_vehicle_id,
                ..
            } => {
                assert_eq!(previous_driver_id, None);
                assert_eq!(previous_vehicle_id, None);
            }
            other => panic!("expected LoadReassigned, got {:?}", other),
        }
    }

    #[test]
    fn test_unassign_clears_both_references() {
        let load = load_with(LoadStatus::Assigned, Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        let result = compute_dispatcher_transition(&load, DispatcherAction::Unassign, None, None)
            .expect("legal transition");

        assert_eq!(result.next_status, LoadStatus::Unassigned);
        assert_eq!(result.assignment, AssignmentChange::Clear);

        let updated = result.apply_to(&load, Utc::now());
        assert_eq!(updated.driver_id, None);
        assert_eq!(updated.vehicle_id, None);
    }

    #[test]
    fn test_cancel_only_from_pre_dispatch_statuses() {
        for status in [LoadStatus::Unassigned, LoadStatus::Draft, LoadStatus::Assigned] {
            let load = load_with(status, None, None);
            let result =
                compute_dispatcher_transition(&load, DispatcherAction::Cancel, None, None)
                    .expect("legal transition");
            assert_eq!(result.next_status, LoadStatus::Cancelled);
        }

        for status in [
            LoadStatus::AtPickup,
            LoadStatus::InTransit,
            LoadStatus::AtDelivery,
            LoadStatus::Delivered,
            LoadStatus::Cancelled,
        ] {
            let load = load_with(status, None, None);
            let result = compute_dispatcher_transition(&load, DispatcherAction::Cancel, None, None);
            assert!(matches!(result, Err(AppError::IllegalTransition(_))));
        }
    }

    #[test]
    fn test_cancel_uses_default_reason() {
        let load = load_with(LoadStatus::Draft, None, None);
        let result = compute_dispatcher_transition(&load, DispatcherAction::Cancel, None, None)
            .expect("legal transition");
        match result.event_payload {
            EventPayload::LoadCancelled { reason, .. } => {
                assert_eq!(reason, "No reason provided");
            }
            other => panic!("expected LoadCancelled, got {:?}", other),
        }

        let load = load_with(LoadStatus::Draft, None, None);
        let result = compute_dispatcher_transition(
            &load,
            DispatcherAction::Cancel,
            None,
            Some("Customer cancelled the order"),
        )
        .expect("legal transition");
        match result.event_payload {
            EventPayload::LoadCancelled { reason, .. } => {
                assert_eq!(reason, "Customer cancelled the order");
            }
            other => panic!("expected LoadCancelled, got {:?}", other),
        }
    }

    #[test]
    fn test_reactivate_always_lands_on_draft() {
        let load = load_with(LoadStatus::Cancelled, None, None);
        let result = compute_dispatcher_transition(&load, DispatcherAction::Reactivate, None, None)
            .expect("legal transition");
        assert_eq!(result.next_status, LoadStatus::Draft);

        for status in [
            LoadStatus::Draft,
            LoadStatus::Unassigned,
            LoadStatus::Assigned,
            LoadStatus::Delivered,
        ] {
            let load = load_with(status, None, None);
            let result =
                compute_dispatcher_transition(&load, DispatcherAction::Reactivate, None, None);
            assert!(matches!(result, Err(AppError::IllegalTransition(_))));
        }
    }

    #[test]
    fn test_dispatcher_guard_role_set() {
        let allowed: BTreeSet<Role> = [Role::Dispatcher].into_iter().collect();
        assert!(assert_dispatcher_action_allowed(&allowed).is_ok());

        let owner: BTreeSet<Role> = [Role::Owner, Role::Billing].into_iter().collect();
        assert!(assert_dispatcher_action_allowed(&owner).is_ok());

        let driver_only: BTreeSet<Role> = [Role::Driver].into_iter().collect();
        assert!(matches!(
            assert_dispatcher_action_allowed(&driver_only),
            Err(AppError::Forbidden(_))
        ));

        let empty: BTreeSet<Role> = BTreeSet::new();
        assert!(matches!(
            assert_dispatcher_action_allowed(&empty),
            Err(AppError::Unauthorized(_))
        ));
    }
}
