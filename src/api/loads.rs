//! Endpoints de cargas
//!
//! Handlers finos: mapean DTOs y delegan toda la semántica al servicio
//! de cargas y al orquestador. Los errores de la taxonomía llegan al
//! cliente con su tipo intacto; aquí no se re-envuelve nada.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::actor::ActorClaims;
use crate::models::event::LoadEvent;
use crate::models::load::{Load, LoadStatus, Stop, StopType};
use crate::models::transition::{AssignmentData, DispatcherAction, DriverAction};
use crate::services::{CreateLoadParams, NewStop};
use crate::state::AppState;
use crate::utils::errors::{invalid_payload_error, AppError};

pub fn create_load_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_load))
        .route("/", get(list_loads))
        .route("/:id", get(get_load))
        .route("/:id/events", get(list_events))
        .route("/:id/driver-action", post(apply_driver_action))
        .route("/:id/dispatcher-action", post(apply_dispatcher_action))
        .route("/:id/documents", post(upload_document))
}

/// Wrapper estándar de respuestas de la API
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }
}

/// Request de creación de carga
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoadRequest {
    pub initial_status: LoadStatus,
    #[validate(length(min = 2, message = "a load requires at least two stops"))]
    pub stops: Vec<NewStopRequest>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct NewStopRequest {
    #[serde(rename = "type")]
    pub stop_type: StopType,
    pub scheduled_time: DateTime<Utc>,
}

/// Request de acción de driver
#[derive(Debug, Deserialize)]
pub struct DriverActionRequest {
    pub action: DriverAction,
}

/// Request de acción de dispatcher. `driver_id` y `vehicle_id` solo se
/// convierten en datos de asignación cuando vienen los dos.
#[derive(Debug, Deserialize)]
pub struct DispatcherActionRequest {
    pub action: DispatcherAction,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub reason: Option<String>,
}

impl DispatcherActionRequest {
    fn assignment(&self) -> Option<AssignmentData> {
        match (self.driver_id, self.vehicle_id) {
            (Some(driver_id), Some(vehicle_id)) => Some(AssignmentData {
                driver_id,
                vehicle_id,
            }),
            _ => None,
        }
    }
}

/// Filtros de listado de cargas
#[derive(Debug, Deserialize)]
pub struct LoadFilters {
    pub status: Option<String>,
}

/// Response de parada
#[derive(Debug, Serialize)]
pub struct StopResponse {
    #[serde(rename = "type")]
    pub stop_type: String,
    pub sequence: u32,
    pub scheduled_time: String,
    pub actual_time: Option<String>,
    pub is_completed: bool,
}

impl From<&Stop> for StopResponse {
    fn from(stop: &Stop) -> Self {
        Self {
            stop_type: stop.stop_type.as_str().to_string(),
            sequence: stop.sequence,
            scheduled_time: stop.scheduled_time.to_rfc3339(),
            actual_time: stop.actual_time.map(|t| t.to_rfc3339()),
            is_completed: stop.is_completed,
        }
    }
}

/// Response de carga para la API
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub id: String,
    pub fleet_id: String,
    pub load_number: String,
    pub status: String,
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub stops: Vec<StopResponse>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Load> for LoadResponse {
    fn from(load: Load) -> Self {
        Self {
            id: load.id.to_string(),
            fleet_id: load.fleet_id.to_string(),
            load_number: load.load_number.clone(),
            status: load.status.as_str().to_string(),
            driver_id: load.driver_id.map(|id| id.to_string()),
            vehicle_id: load.vehicle_id.map(|id| id.to_string()),
            stops: load.stops.iter().map(StopResponse::from).collect(),
            notes: load.notes,
            created_at: load.created_at.to_rfc3339(),
            updated_at: load.updated_at.to_rfc3339(),
        }
    }
}

/// Response de evento de auditoría
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: String,
    pub load_id: String,
    pub event_type: String,
    pub actor_uid: String,
    pub created_at: String,
    pub payload: serde_json::Value,
}

impl From<LoadEvent> for EventResponse {
    fn from(event: LoadEvent) -> Self {
        let payload = serde_json::to_value(&event.payload).unwrap_or(serde_json::Value::Null);
        Self {
            id: event.id.to_string(),
            load_id: event.load_id.to_string(),
            event_type: event.event_type.as_str().to_string(),
            actor_uid: event.actor_uid,
            created_at: event.created_at.to_rfc3339(),
            payload,
        }
    }
}

async fn create_load(
    State(state): State<AppState>,
    Extension(claims): Extension<ActorClaims>,
    Json(request): Json<CreateLoadRequest>,
) -> Result<Json<ApiResponse<LoadResponse>>, AppError> {
    request.validate()?;

    let params = CreateLoadParams {
        initial_status: request.initial_status,
        stops: request
            .stops
            .into_iter()
            .map(|s| NewStop {
                stop_type: s.stop_type,
                scheduled_time: s.scheduled_time,
            })
            .collect(),
        notes: request.notes,
    };

    let load = state.loads.create_load(&claims, params).await?;
    Ok(Json(ApiResponse::success(LoadResponse::from(load))))
}

async fn get_load(
    State(state): State<AppState>,
    Extension(claims): Extension<ActorClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<LoadResponse>, AppError> {
    let load = state.loads.get_load(&claims, id).await?;
    Ok(Json(LoadResponse::from(load)))
}

async fn list_loads(
    State(state): State<AppState>,
    Extension(claims): Extension<ActorClaims>,
    Query(filters): Query<LoadFilters>,
) -> Result<Json<Vec<LoadResponse>>, AppError> {
    let status = match filters.status.as_deref() {
        Some(raw) => Some(
            LoadStatus::from_str(raw)
                .ok_or_else(|| invalid_payload_error(&format!("Unknown status '{}'", raw)))?,
        ),
        None => None,
    };

    let loads = state.loads.list_loads(&claims, status).await?;
    Ok(Json(loads.into_iter().map(LoadResponse::from).collect()))
}

async fn list_events(
    State(state): State<AppState>,
    Extension(claims): Extension<ActorClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state.loads.list_events(&claims, id).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

async fn apply_driver_action(
    State(state): State<AppState>,
    Extension(claims): Extension<ActorClaims>,
    Path(id): Path<Uuid>,
    Json(request): Json<DriverActionRequest>,
) -> Result<Json<ApiResponse<LoadResponse>>, AppError> {
    let load = state
        .orchestrator
        .apply_driver_action(&claims, id, request.action)
        .await?;
    Ok(Json(ApiResponse::success(LoadResponse::from(load))))
}

async fn apply_dispatcher_action(
    State(state): State<AppState>,
    Extension(claims): Extension<ActorClaims>,
    Path(id): Path<Uuid>,
    Json(request): Json<DispatcherActionRequest>,
) -> Result<Json<ApiResponse<LoadResponse>>, AppError> {
    let assignment = request.assignment();
    let load = state
        .orchestrator
        .apply_dispatcher_action(&claims, id, request.action, assignment, request.reason)
        .await?;
    Ok(Json(ApiResponse::success(LoadResponse::from(load))))
}

async fn upload_document(
    Extension(_claims): Extension<ActorClaims>,
    Path(_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    // El almacenamiento de documentos vive en otro servicio
    Err(AppError::NotImplemented(
        "Document upload is handled by the documents service".to_string(),
    ))
}
