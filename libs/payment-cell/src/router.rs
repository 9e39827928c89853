use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn payment_routes(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_payments))
        .route("/submit", post(handlers::submit_payment))
        .route("/verify", post(handlers::verify_payment))
        .route("/appointment/{appointment_id}", get(handlers::get_appointment_payment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
