use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::{Role, SessionUser};
use shared_models::error::AppError;
use shared_utils::{AppState, SessionGate};

use crate::models::StatusToggle;
use crate::services::PatientService;

pub async fn list_patients(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    SessionGate::new(&state).require(&user, &[Role::Admin]).await?;
    let patients = PatientService::new(&state).list_patients().await?;
    Ok(Json(json!({ "patients": patients })))
}

pub async fn toggle_user_status(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StatusToggle>, AppError> {
    let admin = SessionGate::new(&state).require(&user, &[Role::Admin]).await?;
    let user = PatientService::new(&state).toggle_status(&admin, user_id).await?;
    Ok(Json(StatusToggle { success: true, user }))
}
