//! Identidad del actor
//!
//! Este módulo modela los claims del proveedor de identidad. Para este
//! core son un input opaco: nunca se mutan. Los roles se modelan siempre
//! como conjunto a nivel de tipos, sin normalización en runtime.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles del sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Dispatcher,
    FleetManager,
    MaintenanceManager,
    Billing,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Dispatcher => "dispatcher",
            Role::FleetManager => "fleet_manager",
            Role::MaintenanceManager => "maintenance_manager",
            Role::Billing => "billing",
            Role::Driver => "driver",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            "dispatcher" => Some(Role::Dispatcher),
            "fleet_manager" => Some(Role::FleetManager),
            "maintenance_manager" => Some(Role::MaintenanceManager),
            "billing" => Some(Role::Billing),
            "driver" => Some(Role::Driver),
            _ => None,
        }
    }

    /// Etiqueta legible para la UI
    pub fn label(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Admin => "Admin",
            Role::Dispatcher => "Dispatcher",
            Role::FleetManager => "Fleet Manager",
            Role::MaintenanceManager => "Maintenance Manager",
            Role::Billing => "Billing",
            Role::Driver => "Driver",
        }
    }
}

/// Claims del actor autenticado, suministrados por el proveedor de identidad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorClaims {
    pub uid: String,
    pub fleet_id: Uuid,
    pub roles: BTreeSet<Role>,
    pub driver_id: Option<Uuid>,
}

impl ActorClaims {
    /// Verifica si el actor tiene al menos uno de los roles requeridos
    pub fn has_any_role(&self, required_roles: &[Role]) -> bool {
        required_roles.iter().any(|role| self.roles.contains(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_with(roles: &[Role]) -> ActorClaims {
        ActorClaims {
            uid: "user_123".to_string(),
            fleet_id: Uuid::new_v4(),
            roles: roles.iter().copied().collect(),
            driver_id: None,
        }
    }

    #[test]
    fn test_has_any_role() {
        let dispatcher = claims_with(&[Role::Dispatcher]);
        assert!(dispatcher.has_any_role(&[Role::Dispatcher, Role::Owner]));
        assert!(!dispatcher.has_any_role(&[Role::Billing]));

        let nobody = claims_with(&[]);
        assert!(!nobody.has_any_role(&[Role::Dispatcher, Role::Owner, Role::Admin]));
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [
            Role::Owner,
            Role::Admin,
            Role::Dispatcher,
            Role::FleetManager,
            Role::MaintenanceManager,
            Role::Billing,
            Role::Driver,
        ] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("super_admin"), None);
    }
}
