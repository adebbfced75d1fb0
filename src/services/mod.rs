//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación: el
//! orquestador de acciones y el servicio de creación/lectura de cargas.

pub mod load_service;
pub mod orchestrator;

pub use load_service::{CreateLoadParams, LoadService, NewStop};
pub use orchestrator::{ActionOrchestrator, ActionOutcome, RetryPolicy, StagedAction};
