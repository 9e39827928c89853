use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::{Role, SessionUser};
use shared_models::error::AppError;
use shared_utils::{AppState, SessionGate};

use crate::models::{AttachmentRequest, RecordQuery, SavePrescriptionRequest};
use crate::services::RecordService;

pub async fn save_prescription(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<SavePrescriptionRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = SessionGate::new(&state).require(&user, &[Role::Doctor]).await?;
    let (prescription, record) = RecordService::new(&state)
        .save_prescription(&doctor, request, Utc::now())
        .await?;
    Ok(Json(json!({ "prescription": prescription, "record": record })))
}

pub async fn get_prescription(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[]).await?;
    let prescription = RecordService::new(&state)
        .get_prescription(&account, appointment_id)
        .await?;
    Ok(Json(json!({ "prescription": prescription })))
}

pub async fn list_records(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[]).await?;
    let records = RecordService::new(&state).list_records(&account, query).await?;
    Ok(Json(json!({ "records": records })))
}

pub async fn add_attachment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(record_id): Path<Uuid>,
    Json(request): Json<AttachmentRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = SessionGate::new(&state).require(&user, &[Role::Doctor]).await?;
    let record = RecordService::new(&state)
        .add_attachment(&doctor, record_id, &request.file)
        .await?;
    Ok(Json(json!({ "record": record })))
}
