use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::{Role, SessionUser};
use shared_models::error::AppError;
use shared_utils::{AppState, SessionGate};

use crate::models::{
    CreateHolidayRequest, DashboardStats, GalleryUploadRequest, SeedResponse, SettingsImageRequest,
    UpdateSettingsRequest,
};
use crate::services::{DashboardService, GalleryService, HolidayService, SettingsService};

async fn require_admin(state: &AppState, user: &SessionUser) -> Result<(), AppError> {
    SessionGate::new(state).require(user, &[Role::Admin]).await?;
    Ok(())
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let settings = SettingsService::new(&state).get_settings().await?;
    Ok(Json(json!({ "settings": settings })))
}

pub async fn list_gallery(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let images = GalleryService::new(&state).list_images().await?;
    Ok(Json(json!({ "images": images })))
}

pub async fn list_holidays(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let holidays = HolidayService::new(&state).list_holidays().await?;
    Ok(Json(json!({ "holidays": holidays })))
}

pub async fn seed(
    State(state): State<AppState>,
) -> Result<Json<SeedResponse>, AppError> {
    let seeded = SettingsService::new(&state).seed().await?;
    Ok(Json(seeded))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &user).await?;
    let settings = SettingsService::new(&state).update_settings(request).await?;
    Ok(Json(json!({ "settings": settings })))
}

pub async fn upload_settings_image(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<SettingsImageRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &user).await?;
    let settings = SettingsService::new(&state).upload_image(request).await?;
    Ok(Json(json!({ "settings": settings })))
}

pub async fn add_gallery_image(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<GalleryUploadRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &user).await?;
    let image = GalleryService::new(&state).add_image(request).await?;
    Ok(Json(json!({ "image": image })))
}

pub async fn remove_gallery_image(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(image_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &user).await?;
    GalleryService::new(&state).remove_image(image_id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn add_holiday(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<CreateHolidayRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &user).await?;
    let holiday = HolidayService::new(&state).add_holiday(request).await?;
    Ok(Json(json!({ "holiday": holiday })))
}

pub async fn remove_holiday(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(holiday_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&state, &user).await?;
    HolidayService::new(&state).remove_holiday(holiday_id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<DashboardStats>, AppError> {
    require_admin(&state, &user).await?;
    let stats = DashboardService::new(&state).stats(Utc::now()).await?;
    Ok(Json(stats))
}
