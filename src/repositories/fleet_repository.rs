//! Lookup de drivers y vehículos
//!
//! Acceso de solo lectura a los registros de driver y vehículo del fleet.
//! Este core nunca muta esos registros: asignar una carga solo guarda la
//! referencia. El lookup existe para validar que el objetivo de una
//! asignación existe y pertenece al fleet del actor.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::utils::errors::{not_found_error, AppResult};

/// Registro de driver, tal como lo entrega el almacén externo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub id: Uuid,
    pub fleet_id: Uuid,
    pub name: String,
}

/// Registro de vehículo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: Uuid,
    pub fleet_id: Uuid,
    pub license_plate: String,
}

/// Contrato de lookup de solo lectura.
///
/// Un registro de otro fleet se reporta igual que uno inexistente.
#[async_trait]
pub trait FleetLookup: Send + Sync {
    async fn get_driver(&self, fleet_id: Uuid, driver_id: Uuid) -> AppResult<DriverRecord>;
    async fn get_vehicle(&self, fleet_id: Uuid, vehicle_id: Uuid) -> AppResult<VehicleRecord>;
    async fn list_drivers(&self, fleet_id: Uuid) -> AppResult<Vec<DriverRecord>>;
    async fn list_vehicles(&self, fleet_id: Uuid) -> AppResult<Vec<VehicleRecord>>;
}

/// Implementación en memoria del lookup, con seeding para tests y demo
pub struct InMemoryFleetLookup {
    drivers: RwLock<HashMap<Uuid, DriverRecord>>,
    vehicles: RwLock<HashMap<Uuid, VehicleRecord>>,
}

impl InMemoryFleetLookup {
    pub fn new() -> Self {
        Self {
            drivers: RwLock::new(HashMap::new()),
            vehicles: RwLock::new(HashMap::new()),
        }
    }

    pub async fn add_driver(&self, fleet_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let record = DriverRecord {
            id,
            fleet_id,
            name: name.to_string(),
        };
        self.drivers.write().await.insert(id, record);
        id
    }

    pub async fn add_vehicle(&self, fleet_id: Uuid, license_plate: &str) -> Uuid {
        let id = Uuid::new_v4();
        let record = VehicleRecord {
            id,
            fleet_id,
            license_plate: license_plate.to_string(),
        };
        self.vehicles.write().await.insert(id, record);
        id
    }
}

impl Default for InMemoryFleetLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FleetLookup for InMemoryFleetLookup {
    async fn get_driver(&self, fleet_id: Uuid, driver_id: Uuid) -> AppResult<DriverRecord> {
        let drivers = self.drivers.read().await;
        match drivers.get(&driver_id) {
            Some(record) if record.fleet_id == fleet_id => Ok(record.clone()),
            _ => Err(not_found_error("Driver", &driver_id.to_string())),
        }
    }

    async fn get_vehicle(&self, fleet_id: Uuid, vehicle_id: Uuid) -> AppResult<VehicleRecord> {
        let vehicles = self.vehicles.read().await;
        match vehicles.get(&vehicle_id) {
            Some(record) if record.fleet_id == fleet_id => Ok(record.clone()),
            _ => Err(not_found_error("Vehicle", &vehicle_id.to_string())),
        }
    }

    async fn list_drivers(&self, fleet_id: Uuid) -> AppResult<Vec<DriverRecord>> {
        let drivers = self.drivers.read().await;
        let mut records: Vec<DriverRecord> = drivers
            .values()
            .filter(|r| r.fleet_id == fleet_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    async fn list_vehicles(&self, fleet_id: Uuid) -> AppResult<Vec<VehicleRecord>> {
        let vehicles = self.vehicles.read().await;
        let mut records: Vec<VehicleRecord> = vehicles
            .values()
            .filter(|r| r.fleet_id == fleet_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.license_plate.cmp(&b.license_plate));
        Ok(records)
    }
}
