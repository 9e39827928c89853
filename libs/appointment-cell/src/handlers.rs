use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{Role, SessionUser};
use shared_models::error::AppError;
use shared_utils::{AppState, SessionGate};

use crate::models::{
    AppointmentQuery, AssignTokenRequest, BookAppointmentRequest, UpdateStatusRequest, UpdateTokenRequest,
};
use crate::services::{AppointmentBookingService, AppointmentWorkflowService};

// ==============================================================================
// BOOKING
// ==============================================================================

pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let patient = SessionGate::new(&state).require(&user, &[Role::Patient]).await?;
    debug!("Booking request from patient {} for doctor {}", patient.id, request.doctor_id);

    let booking = AppointmentBookingService::new(&state)
        .book_appointment(&patient, request, Utc::now())
        .await?;
    Ok(Json(json!(booking)))
}

pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[]).await?;
    let appointments = AppointmentBookingService::new(&state)
        .list_appointments(&account, query)
        .await?;
    Ok(Json(json!({ "appointments": appointments })))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[]).await?;
    let appointment = AppointmentBookingService::new(&state)
        .get_appointment(&account, appointment_id)
        .await?;
    Ok(Json(json!({ "appointment": appointment })))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[]).await?;
    let appointment = AppointmentBookingService::new(&state)
        .cancel_appointment(&account, appointment_id, Utc::now())
        .await?;
    Ok(Json(json!({ "success": true, "appointment": appointment })))
}

// ==============================================================================
// VISIT WORKFLOW
// ==============================================================================

pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[Role::Doctor, Role::Admin]).await?;
    let appointment = AppointmentWorkflowService::new(&state)
        .update_status(&account, appointment_id, request.status, Utc::now())
        .await?;
    Ok(Json(json!({ "appointment": appointment })))
}

pub async fn assign_token(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<AssignTokenRequest>,
) -> Result<Json<Value>, AppError> {
    SessionGate::new(&state).require(&user, &[Role::Admin]).await?;
    let appointment = AppointmentWorkflowService::new(&state)
        .assign_token(request.appointment_id, request.token_number, Utc::now())
        .await?;
    Ok(Json(json!({ "success": true, "appointment": appointment })))
}

pub async fn update_token(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<UpdateTokenRequest>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[Role::Doctor, Role::Admin]).await?;
    let appointment = AppointmentWorkflowService::new(&state)
        .update_token(&account, request.appointment_id, request.token_status, Utc::now())
        .await?;
    Ok(Json(json!({ "success": true, "appointment": appointment })))
}
