//! Modelo de Load
//!
//! Este módulo contiene el struct Load, sus paradas embebidas y el
//! vocabulario cerrado de estados. Añadir un estado requiere actualizar
//! cada `match` sobre `LoadStatus`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estado de la carga - conjunto cerrado, ordenado por progresión del ciclo de vida
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    Draft,
    Unassigned,
    Assigned,
    AtPickup,
    InTransit,
    AtDelivery,
    Delivered,
    Cancelled,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Draft => "DRAFT",
            LoadStatus::Unassigned => "UNASSIGNED",
            LoadStatus::Assigned => "ASSIGNED",
            LoadStatus::AtPickup => "AT_PICKUP",
            LoadStatus::InTransit => "IN_TRANSIT",
            LoadStatus::AtDelivery => "AT_DELIVERY",
            LoadStatus::Delivered => "DELIVERED",
            LoadStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(LoadStatus::Draft),
            "UNASSIGNED" => Some(LoadStatus::Unassigned),
            "ASSIGNED" => Some(LoadStatus::Assigned),
            "AT_PICKUP" => Some(LoadStatus::AtPickup),
            "IN_TRANSIT" => Some(LoadStatus::InTransit),
            "AT_DELIVERY" => Some(LoadStatus::AtDelivery),
            "DELIVERED" => Some(LoadStatus::Delivered),
            "CANCELLED" => Some(LoadStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tipo de parada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopType {
    Pickup,
    Delivery,
}

impl StopType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopType::Pickup => "PICKUP",
            StopType::Delivery => "DELIVERY",
        }
    }
}

impl std::fmt::Display for StopType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parada embebida en una carga. No tiene identidad fuera de su Load.
///
/// Invariante: `is_completed == true` implica `actual_time != None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    #[serde(rename = "type")]
    pub stop_type: StopType,
    pub sequence: u32,
    pub scheduled_time: DateTime<Utc>,
    pub actual_time: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

impl Stop {
    pub fn new(stop_type: StopType, sequence: u32, scheduled_time: DateTime<Utc>) -> Self {
        Self {
            stop_type,
            sequence,
            scheduled_time,
            actual_time: None,
            is_completed: false,
        }
    }
}

/// Load principal - la entidad central del sistema.
///
/// `driver_id` y `vehicle_id` son `None` exactamente cuando la carga no
/// está asignada. El orden de `stops` define el orden de la ruta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub id: Uuid,
    pub fleet_id: Uuid,
    pub load_number: String,
    pub status: LoadStatus,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub stops: Vec<Stop>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Load {
    /// Índice de la primera parada del tipo dado, en orden de ruta
    pub fn first_stop_index(&self, stop_type: StopType) -> Option<usize> {
        self.stops.iter().position(|s| s.stop_type == stop_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            LoadStatus::Draft,
            LoadStatus::Unassigned,
            LoadStatus::Assigned,
            LoadStatus::AtPickup,
            LoadStatus::InTransit,
            LoadStatus::AtDelivery,
            LoadStatus::Delivered,
            LoadStatus::Cancelled,
        ] {
            assert_eq!(LoadStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(LoadStatus::from_str("IN_FLIGHT"), None);
    }

    #[test]
    fn test_first_stop_index_respects_route_order() {
        let now = Utc::now();
        let load = Load {
            id: Uuid::new_v4(),
            fleet_id: Uuid::new_v4(),
            load_number: "LD-TEST-0001".to_string(),
            status: LoadStatus::Unassigned,
            driver_id: None,
            vehicle_id: None,
            stops: vec![
                Stop::new(StopType::Pickup, 0, now),
                Stop::new(StopType::Pickup, 1, now),
                Stop::new(StopType::Delivery, 2, now),
            ],
            notes: None,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(load.first_stop_index(StopType::Pickup), Some(0));
        assert_eq!(load.first_stop_index(StopType::Delivery), Some(2));
    }
}
