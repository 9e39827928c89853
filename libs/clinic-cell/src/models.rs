use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::{MediaError, StoreError};
use shared_models::clinic::ClinicImageKind;
use shared_models::error::AppError;
use shared_models::user::UserProfile;

pub const GALLERY_FOLDER: &str = "clinic/gallery";

#[derive(Debug, Deserialize)]
pub struct CreateHolidayRequest {
    pub date: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub clinic_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub upi_id: Option<String>,
    pub about: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsImageRequest {
    pub kind: ClinicImageKind,
    pub file: String,
}

#[derive(Debug, Deserialize)]
pub struct GalleryUploadRequest {
    pub file: String,
    pub caption: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedResponse {
    pub success: bool,
    pub admin: UserProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub patients: usize,
    pub doctors: usize,
    pub appointments: usize,
    pub today_appointments: usize,
    pub pending_payments: usize,
    pub today_revenue: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("A holiday already exists on {0}")]
    HolidayExists(String),

    #[error("Admin already exists")]
    AdminExists,

    #[error("Image not found")]
    ImageNotFound,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ClinicError> for AppError {
    fn from(err: ClinicError) -> Self {
        match err {
            ClinicError::HolidayExists(_) | ClinicError::AdminExists => AppError::Conflict(err.to_string()),
            ClinicError::ImageNotFound => AppError::NotFound(err.to_string()),
            ClinicError::Validation(msg) => AppError::ValidationError(msg),
            ClinicError::Media(media) => media.into(),
            ClinicError::App(app) => app,
            ClinicError::Store(store) => store.into(),
        }
    }
}
