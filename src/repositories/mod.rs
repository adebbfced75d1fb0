//! Repositorios
//!
//! Este módulo contiene los contratos con el almacén externo y sus
//! implementaciones en memoria.

pub mod fleet_repository;
pub mod load_repository;

pub use fleet_repository::{DriverRecord, FleetLookup, InMemoryFleetLookup, VehicleRecord};
pub use load_repository::{InMemoryLoadRepository, LoadRepository};
