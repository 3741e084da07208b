// libs/arrival-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{
    ArrivalError, ArrivalRequest, ArrivalResponse, CreateHangoutRequest, MeetingLinkError,
};
use crate::state::ArrivalCellState;

// ==============================================================================
// ARRIVAL HANDLERS
// ==============================================================================

/// Report that a patient or practitioner joined the visit
#[axum::debug_handler]
pub async fn report_arrival(
    State(state): State<Arc<ArrivalCellState>>,
    payload: Result<Json<ArrivalRequest>, JsonRejection>,
) -> Result<Json<ArrivalResponse>, AppError> {
    let Json(request) = payload.map_err(map_body_rejection)?;
    let outcome = state
        .notifications
        .handle_request(request)
        .await
        .map_err(|e| match e {
            ArrivalError::Validation(message) => AppError::ValidationError(message),
            ArrivalError::Unauthorized(message) => AppError::Auth(message),
            ArrivalError::AuthorizationUnavailable(message) => {
                AppError::ExternalService(format!("FHIR authorization unavailable: {}", message))
            }
            ArrivalError::NotFound(encounter_id) => {
                AppError::NotFound(format!("Encounter {} not found", encounter_id))
            }
            ArrivalError::Store(message) => AppError::Database(message),
            transport @ ArrivalError::Transport { .. } => {
                AppError::NotificationFailed(transport.to_string())
            }
        })?;

    Ok(Json(ArrivalResponse::from(outcome)))
}

// ==============================================================================
// MEETING LINK HANDLERS
// ==============================================================================

/// Look up the meeting url of an encounter; `{}` when unknown
#[axum::debug_handler]
pub async fn get_hangout(
    State(state): State<Arc<ArrivalCellState>>,
    Path(encounter_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let url = state
        .meetings
        .find_link(&encounter_id)
        .await
        .map_err(map_meeting_error)?;

    Ok(Json(match url {
        Some(url) => json!({ "url": url }),
        None => json!({}),
    }))
}

/// Return the meeting url for an encounter, creating the encounter if needed
#[axum::debug_handler]
pub async fn create_hangout(
    State(state): State<Arc<ArrivalCellState>>,
    payload: Result<Json<CreateHangoutRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(map_body_rejection)?;
    let encounter_id = request
        .encounter_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("encounterId is required".to_string()))?;

    let url = state
        .meetings
        .get_or_create_link(&encounter_id)
        .await
        .map_err(map_meeting_error)?;

    Ok(Json(json!({ "url": url })))
}

fn map_body_rejection(rejection: JsonRejection) -> AppError {
    AppError::ValidationError(format!("Invalid request body: {}", rejection.body_text()))
}

fn map_meeting_error(e: MeetingLinkError) -> AppError {
    match e {
        MeetingLinkError::NotConfigured => {
            AppError::Internal("Meeting links not configured".to_string())
        }
        MeetingLinkError::Provider(message) => AppError::ExternalService(message),
        MeetingLinkError::Store(err) => AppError::Database(err.to_string()),
    }
}

// ==============================================================================
// SYSTEM HANDLERS
// ==============================================================================

/// Public settings consumed by the SMART launch page
#[axum::debug_handler]
pub async fn get_settings(State(state): State<Arc<ArrivalCellState>>) -> Json<Value> {
    Json(json!({ "fhirClientId": state.config.fhir_client_id }))
}

/// Health check for the arrival pipeline
#[axum::debug_handler]
pub async fn arrival_health_check(State(state): State<Arc<ArrivalCellState>>) -> Json<Value> {
    let config = &state.config;

    Json(json!({
        "status": if config.is_fhir_configured() { "healthy" } else { "not_configured" },
        "trusted_fhir_origins": config.fhir_allowed_origins.len(),
        "ehr_writeback_enabled": state.notifications.writeback_enabled(),
        "mllp_target": format!("{}:{}", config.mllp_host, config.mllp_port),
    }))
}
