use axum::{
    Router,
    routing::{delete, get, post, put},
    middleware,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn clinic_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/settings", get(handlers::get_settings))
        .route("/gallery", get(handlers::list_gallery))
        .route("/holidays", get(handlers::list_holidays))
        .route("/seed", post(handlers::seed));

    let protected_routes = Router::new()
        .route("/settings", put(handlers::update_settings))
        .route("/settings/images", post(handlers::upload_settings_image))
        .route("/gallery", post(handlers::add_gallery_image))
        .route("/gallery/{image_id}", delete(handlers::remove_gallery_image))
        .route("/holidays", post(handlers::add_holiday))
        .route("/holidays/{holiday_id}", delete(handlers::remove_holiday))
        .route("/dashboard", get(handlers::dashboard))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
