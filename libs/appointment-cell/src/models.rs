use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::DoctorError;
use shared_database::StoreError;
use shared_models::appointment::{Appointment, AppointmentStatus, TokenStatus};
use shared_models::error::AppError;
use shared_models::payment::Payment;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTokenRequest {
    pub appointment_id: Uuid,
    pub token_number: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTokenRequest {
    pub appointment_id: Uuid,
    pub token_status: TokenStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentQuery {
    pub status: Option<AppointmentStatus>,
    pub date: Option<String>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// A fresh booking with the payment the patient still has to settle.
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub appointment: Appointment,
    pub payment: Payment,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor is not accepting appointments")]
    DoctorInactive,

    #[error("Requested time is not a bookable slot")]
    NotASlot,

    #[error("Cannot change appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment cannot be cancelled in status {0}")]
    NotCancellable(AppointmentStatus),

    #[error("Appointment is no longer active ({0})")]
    Inactive(AppointmentStatus),

    #[error("No token has been assigned to this appointment")]
    TokenNotAssigned,

    #[error("Forbidden")]
    NotParticipant,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Doctor(#[from] DoctorError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::DoctorInactive
            | AppointmentError::InvalidStatusTransition { .. }
            | AppointmentError::NotCancellable(_)
            | AppointmentError::Inactive(_)
            | AppointmentError::TokenNotAssigned => AppError::Conflict(err.to_string()),
            AppointmentError::NotASlot => AppError::ValidationError(err.to_string()),
            AppointmentError::NotParticipant => AppError::Forbidden(err.to_string()),
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::Doctor(doctor) => doctor.into(),
            AppointmentError::App(app) => app,
            AppointmentError::Store(store) => store.into(),
        }
    }
}
