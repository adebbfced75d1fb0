//! Middleware de claims
//!
//! Extrae la identidad del actor y la inyecta en la request. La
//! autenticación real queda fuera de este servicio: aguas arriba un
//! gateway valida la sesión y propaga los claims en headers. Este
//! middleware es la costura declarada con ese proveedor de identidad.

use std::collections::BTreeSet;

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use uuid::Uuid;

use crate::models::actor::{ActorClaims, Role};
use crate::utils::errors::{AppError, AppResult};

const HEADER_ACTOR_UID: &str = "x-actor-uid";
const HEADER_FLEET_ID: &str = "x-fleet-id";
const HEADER_ROLES: &str = "x-roles";
const HEADER_DRIVER_ID: &str = "x-driver-id";

/// Middleware que materializa `ActorClaims` desde los headers
pub async fn claims_middleware(mut request: Request, next: Next) -> Result<Response, AppError> {
    let claims = extract_claims(request.headers())?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn extract_claims(headers: &HeaderMap) -> AppResult<ActorClaims> {
    let uid = header_str(headers, HEADER_ACTOR_UID)?
        .ok_or_else(|| AppError::Unauthorized("Actor identity header missing".to_string()))?
        .to_string();

    let fleet_id = header_str(headers, HEADER_FLEET_ID)?
        .ok_or_else(|| AppError::Unauthorized("Fleet header missing".to_string()))?;
    let fleet_id = Uuid::parse_str(fleet_id)
        .map_err(|_| AppError::Unauthorized("Fleet header is not a valid id".to_string()))?;

    let mut roles = BTreeSet::new();
    if let Some(raw_roles) = header_str(headers, HEADER_ROLES)? {
        for name in raw_roles.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let role = Role::from_str(name).ok_or_else(|| {
                AppError::Unauthorized(format!("Unknown role '{}' in claims", name))
            })?;
            roles.insert(role);
        }
    }

    let driver_id = match header_str(headers, HEADER_DRIVER_ID)? {
        Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
            AppError::Unauthorized("Driver header is not a valid id".to_string())
        })?),
        None => None,
    };

    Ok(ActorClaims {
        uid,
        fleet_id,
        roles,
        driver_id,
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<Option<&'a str>> {
    match headers.get(name) {
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| AppError::Unauthorized(format!("Header {} is not valid UTF-8", name))),
        None => Ok(None),
    }
}
