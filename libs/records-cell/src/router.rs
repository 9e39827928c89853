use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn records_routes(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_records))
        .route("/prescriptions", post(handlers::save_prescription))
        .route("/prescriptions/{appointment_id}", get(handlers::get_prescription))
        .route("/{record_id}/attachments", post(handlers::add_attachment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
