//! REST API handlers
//!
//! Service listing, lock state inspection and on-demand disruptions.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use shared::{Action, ActionArguments, ServiceInfo};

use crate::engine::ChaosHandle;
use crate::error::ChaosError;
use crate::services::DisruptionResponse;

type ApiResponse = (StatusCode, Json<Value>);

/// Liveness of the API - /status
pub async fn get_status(State(handle): State<ChaosHandle>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "services": handle.router().services().len(),
        "hosts": handle.router().addresses().len(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Every known service with its available disruptions - /services
pub async fn list_services(State(handle): State<ChaosHandle>) -> Json<Vec<ServiceInfo>> {
    Json(handle.services())
}

/// Whether an action is in flight - /services/:service/:action/status
pub async fn disruption_status(
    State(handle): State<ChaosHandle>,
    Path((service, action)): Path<(String, String)>,
) -> ApiResponse {
    let action = match resolve(&handle, &service, &action) {
        Ok(action) => action,
        Err(response) => return response,
    };

    (
        StatusCode::OK,
        Json(json!({
            "service": service,
            "action": action.command(),
            "running": handle.is_running(&service, action)
        })),
    )
}

/// Trigger a disruption - POST /services/:service/:action
///
/// The body is optional; when present it must be `ActionArguments` JSON.
pub async fn trigger_disruption(
    State(handle): State<ChaosHandle>,
    Path((service, action)): Path<(String, String)>,
    body: Bytes,
) -> ApiResponse {
    let action = match resolve(&handle, &service, &action) {
        Ok(action) => action,
        Err(response) => return response,
    };

    let args = if body.iter().all(u8::is_ascii_whitespace) {
        ActionArguments::default()
    } else {
        match serde_json::from_slice::<ActionArguments>(&body) {
            Ok(args) => args,
            Err(e) => return error_response(&ChaosError::from(e)),
        }
    };

    match handle.disrupt_service(&service, action, &args).await {
        Ok(response) => disruption_response(&response),
        Err(e) => error_response(&e),
    }
}

fn resolve(handle: &ChaosHandle, service: &str, action: &str) -> Result<Action, ApiResponse> {
    let action: Action = action.parse().map_err(|e| error_response(&ChaosError::SharedError(e)))?;
    if !handle.contains_service(service) {
        return Err(error_response(&ChaosError::UnknownService {
            service: service.to_string(),
        }));
    }
    Ok(action)
}

fn disruption_response(response: &DisruptionResponse) -> ApiResponse {
    let status = match response {
        DisruptionResponse::Completed { .. } | DisruptionResponse::RollingRestartStarted { .. } => StatusCode::OK,
        DisruptionResponse::Conflict { .. } => StatusCode::CONFLICT,
        DisruptionResponse::TransportError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        DisruptionResponse::UnknownService { .. } => StatusCode::NOT_FOUND,
    };

    let mut body = json!({
        "status": if response.is_ok() { "success" } else { "error" },
        "message": response.message()
    });
    if let DisruptionResponse::RollingRestartStarted { session_id, .. } = response {
        body["session_id"] = json!(session_id);
    }
    (status, Json(body))
}

fn error_response(error: &ChaosError) -> ApiResponse {
    let status = match error {
        ChaosError::UnknownService { .. } => StatusCode::NOT_FOUND,
        ChaosError::SharedError(_) | ChaosError::JsonError(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({
            "status": "error",
            "message": error.to_string()
        })),
    )
}
