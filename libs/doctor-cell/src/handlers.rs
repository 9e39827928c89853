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
use shared_utils::validation::parse_date;
use shared_utils::{AppState, SessionGate};

use crate::models::{CreateDoctorRequest, SetAvailabilityRequest, SlotQuery, UpdateDoctorRequest};
use crate::services::{AvailabilityService, DoctorService};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn public_directory(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let directory = DoctorService::new(&state).public_directory().await?;
    Ok(Json(json!({ "doctors": directory })))
}

pub async fn get_available_slots(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date(&query.date)?;
    debug!("Resolving slots for doctor {} on {}", doctor_id, date);

    let schedule = AvailabilityService::new(&state)
        .resolve_slots(doctor_id, date, Utc::now())
        .await?;
    Ok(Json(json!(schedule)))
}

pub async fn get_weekly_schedule(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let rules = AvailabilityService::new(&state).weekly_schedule(doctor_id).await?;
    Ok(Json(json!({ "availability": rules })))
}

// ==============================================================================
// PROTECTED HANDLERS
// ==============================================================================

pub async fn list_doctors(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    SessionGate::new(&state).require(&user, &[Role::Admin]).await?;
    let doctors = DoctorService::new(&state).list_doctors().await?;
    Ok(Json(json!({ "doctors": doctors })))
}

pub async fn create_doctor(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    SessionGate::new(&state).require(&user, &[Role::Admin]).await?;
    let doctor = DoctorService::new(&state).add_doctor(request).await?;
    Ok(Json(json!({ "doctor": doctor })))
}

pub async fn my_profile(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[Role::Doctor]).await?;
    let doctor = DoctorService::new(&state).profile_for_user(account.id).await?;
    Ok(Json(json!({ "doctor": doctor })))
}

pub async fn update_doctor(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    SessionGate::new(&state).require(&user, &[Role::Admin]).await?;
    let doctor = DoctorService::new(&state).update_doctor(doctor_id, request).await?;
    Ok(Json(json!({ "doctor": doctor })))
}

pub async fn remove_doctor(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    SessionGate::new(&state).require(&user, &[Role::Admin]).await?;
    let doctor = DoctorService::new(&state).remove_doctor(doctor_id).await?;
    Ok(Json(json!({ "success": true, "doctor": doctor })))
}

pub async fn set_availability(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[Role::Admin, Role::Doctor]).await?;
    let service = AvailabilityService::new(&state);
    service.ensure_manages(&account, doctor_id).await?;

    let rule = service.set_availability(doctor_id, request).await?;
    Ok(Json(json!({ "availability": rule })))
}

pub async fn deactivate_day(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path((doctor_id, day_of_week)): Path<(Uuid, u8)>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[Role::Admin, Role::Doctor]).await?;
    let service = AvailabilityService::new(&state);
    service.ensure_manages(&account, doctor_id).await?;

    let rule = service.deactivate_day(doctor_id, day_of_week).await?;
    Ok(Json(json!({ "availability": rule })))
}
