use axum::{
    Json, Router,
    routing::get,
};
use serde_json::json;

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use clinic_cell::router::clinic_routes;
use doctor_cell::router::doctor_routes;
use patient_cell::create_patient_router;
use payment_cell::router::payment_routes;
use records_cell::router::records_routes;
use shared_utils::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/payments", payment_routes(state.clone()))
        .nest("/records", records_routes(state.clone()))
        .nest("/patients", create_patient_router(state.clone()))
        .nest("/clinic", clinic_routes(state))
}
