use axum::{middleware, routing::{get, post}, Router};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::*;

pub fn create_patient_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_patients))
        .route("/users/{id}/toggle-status", post(toggle_user_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
