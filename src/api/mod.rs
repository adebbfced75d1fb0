//! API endpoints
//!
//! Este módulo contiene los endpoints de la API.

pub mod loads;

use axum::{middleware, routing::get, Json, Router};
use serde_json::json;

use crate::middleware::claims::claims_middleware;
use crate::state::AppState;

/// Crear el router principal de la API
pub fn create_api_router() -> Router<AppState> {
    let protected = Router::new()
        .nest("/api/load", loads::create_load_router())
        .layer(middleware::from_fn(claims_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "service": "carrier-ops",
        "status": "healthy",
    }))
}
