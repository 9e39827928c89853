use axum::{
    Router,
    routing::{get, put, delete},
    middleware,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn doctor_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/public", get(handlers::public_directory))
        .route("/{doctor_id}/slots", get(handlers::get_available_slots))
        .route("/{doctor_id}/availability", get(handlers::get_weekly_schedule));

    let protected_routes = Router::new()
        .route("/", get(handlers::list_doctors).post(handlers::create_doctor))
        .route("/me", get(handlers::my_profile))
        .route("/{doctor_id}", put(handlers::update_doctor).delete(handlers::remove_doctor))
        .route("/{doctor_id}/availability", put(handlers::set_availability))
        .route("/{doctor_id}/availability/{day_of_week}", delete(handlers::deactivate_day))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
