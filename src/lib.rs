//! Carrier Ops - backend de ciclo de vida de cargas
//!
//! El core del sistema es la máquina de estados del ciclo de vida de una
//! carga (pickup → delivery): los motores de transición puros de driver y
//! dispatcher, los guards de autorización y el orquestador que aplica cada
//! transición con escritura atómica, update optimista y rollback.

pub mod api;
pub mod cache;
pub mod config;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod utils;
