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

use crate::models::{PaymentOutcome, PaymentQuery, SubmitPaymentRequest, VerifyPaymentRequest};
use crate::services::PaymentService;

pub async fn submit_payment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<SubmitPaymentRequest>,
) -> Result<Json<PaymentOutcome>, AppError> {
    let patient = SessionGate::new(&state).require(&user, &[Role::Patient]).await?;
    let outcome = PaymentService::new(&state)
        .submit_payment(&patient, request, Utc::now())
        .await?;
    Ok(Json(outcome))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<PaymentOutcome>, AppError> {
    let admin = SessionGate::new(&state).require(&user, &[Role::Admin]).await?;
    let outcome = PaymentService::new(&state)
        .verify_payment(&admin, request, Utc::now())
        .await?;
    Ok(Json(outcome))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<Value>, AppError> {
    SessionGate::new(&state).require(&user, &[Role::Admin]).await?;
    let payments = PaymentService::new(&state).list_payments(query).await?;
    Ok(Json(json!({ "payments": payments })))
}

pub async fn get_appointment_payment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[]).await?;
    let (payment, appointment) = PaymentService::new(&state)
        .payment_for_appointment(&account, appointment_id)
        .await?;
    Ok(Json(json!({ "payment": payment, "appointment": appointment })))
}
