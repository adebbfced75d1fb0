//! Sistema de manejo de errores
//!
//! Este módulo define la taxonomía de errores del ciclo de vida de cargas
//! y su conversión a respuestas HTTP apropiadas. Los motores de transición
//! y los guards devuelven estos errores sin efectos secundarios; solo el
//! orquestador puede reintentar, y únicamente `TransientStorage`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Missing stop: {0}")]
    MissingStop(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transient storage error: {0}")]
    TransientStorage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl AppError {
    /// Solo los fallos transitorios de almacenamiento admiten reintento.
    /// Las transiciones ilegales y los fallos de autorización son terminales.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AppError::TransientStorage(_))
    }

    /// Código estable del tipo de error, para que el caller distinga
    /// fallos de autorización de fallos de reglas de negocio.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::IllegalTransition(_) => "ILLEGAL_TRANSITION",
            AppError::InvalidPayload(_) => "INVALID_PAYLOAD",
            AppError::MissingStop(_) => "MISSING_STOP",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::TransientStorage(_) => "TRANSIENT_STORAGE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::NotImplemented(_) => "NOT_IMPLEMENTED",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code().to_string();

        let (status, error_response) = match self {
            AppError::IllegalTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: "Illegal Transition".to_string(),
                    message: msg,
                    details: None,
                    code,
                },
            ),

            AppError::InvalidPayload(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid Payload".to_string(),
                    message: msg,
                    details: None,
                    code,
                },
            ),

            AppError::MissingStop(msg) => {
                // Datos de carga malformados, no un error del usuario
                eprintln!("Malformed load data: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Missing Stop".to_string(),
                        message: msg,
                        details: None,
                        code,
                    },
                )
            }

            AppError::Unauthorized(msg) => {
                eprintln!("Unauthorized access: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "Unauthorized".to_string(),
                        message: msg,
                        details: None,
                        code,
                    },
                )
            }

            AppError::Forbidden(msg) => {
                eprintln!("Forbidden access: {}", msg);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse {
                        error: "Forbidden".to_string(),
                        message: msg,
                        details: None,
                        code,
                    },
                )
            }

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code,
                },
            ),

            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message: msg,
                    details: None,
                    code,
                },
            ),

            AppError::TransientStorage(msg) => {
                eprintln!("Transient storage error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: "Service Unavailable".to_string(),
                        message: "The data store is temporarily unavailable".to_string(),
                        details: Some(json!({ "storage_error": msg })),
                        code,
                    },
                )
            }

            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: msg,
                    details: None,
                    code,
                },
            ),

            AppError::Internal(msg) => {
                eprintln!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code,
                    },
                )
            }

            AppError::NotImplemented(msg) => (
                StatusCode::NOT_IMPLEMENTED,
                ErrorResponse {
                    error: "Not Implemented".to_string(),
                    message: msg,
                    details: None,
                    code,
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto de escritura
pub fn conflict_error(resource: &str, id: &str) -> AppError {
    AppError::Conflict(format!(
        "{} with id '{}' changed since it was read",
        resource, id
    ))
}

/// Función helper para crear errores de payload inválido
pub fn invalid_payload_error(message: &str) -> AppError {
    AppError::InvalidPayload(message.to_string())
}
