use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::doctor::{Doctor, DoctorAvailability};
use shared_models::error::AppError;
use shared_models::schedule::TimeOfDay;
use shared_models::user::UserAccount;

pub const NOT_WORKING_MESSAGE: &str = "Doctor is not available on this day";

#[derive(Debug, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub qualification: String,
    #[serde(default)]
    pub experience_years: i32,
    #[serde(default)]
    pub consultation_fee: f64,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i32,
    pub consultation_fee: f64,
    pub bio: Option<String>,
}

/// Doctor row joined with its account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i32,
    pub consultation_fee: f64,
    pub bio: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl DoctorProfile {
    pub fn from_parts(user: &UserAccount, doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            specialization: doctor.specialization.clone(),
            qualification: doctor.qualification.clone(),
            experience_years: doctor.experience_years,
            consultation_fee: doctor.consultation_fee,
            bio: doctor.bio.clone(),
            is_active: user.is_active,
            created_at: doctor.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyWindow {
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub slot_duration: u16,
}

impl From<&DoctorAvailability> for WeeklyWindow {
    fn from(rule: &DoctorAvailability) -> Self {
        Self {
            day_of_week: rule.day_of_week,
            start_time: rule.start_time,
            end_time: rule.end_time,
            slot_duration: rule.slot_duration,
        }
    }
}

/// Directory entry shown to anonymous visitors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicDoctor {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i32,
    pub consultation_fee: f64,
    pub bio: Option<String>,
    pub availability: Vec<WeeklyWindow>,
}

#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub slot_duration: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: String,
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Email already in use")]
    EmailTaken,

    #[error("Doctors may only manage their own schedule")]
    NotOwner,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::EmailTaken => AppError::Conflict(err.to_string()),
            DoctorError::NotOwner => AppError::Forbidden(err.to_string()),
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::App(app) => app,
            DoctorError::Store(store) => store.into(),
        }
    }
}
