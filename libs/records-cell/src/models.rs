use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::AppointmentError;
use shared_database::{MediaError, StoreError};
use shared_models::error::AppError;
use shared_models::record::Medication;

pub const REPORT_FOLDER: &str = "clinic/reports";

#[derive(Debug, Deserialize)]
pub struct SavePrescriptionRequest {
    pub appointment_id: Uuid,
    pub diagnosis: String,
    #[serde(default)]
    pub medications: Vec<Medication>,
    pub instructions: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    pub patient_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentRequest {
    /// Report file as a base64 data URI.
    pub file: String,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Prescription not found")]
    PrescriptionNotFound,

    #[error("Medical record not found")]
    RecordNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Failed to serialize medications: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::AppointmentNotFound
            | RecordError::PrescriptionNotFound
            | RecordError::RecordNotFound => AppError::NotFound(err.to_string()),
            RecordError::Validation(msg) => AppError::ValidationError(msg),
            RecordError::Serialize(_) => AppError::Internal(err.to_string()),
            RecordError::Appointment(appointment) => appointment.into(),
            RecordError::Media(media) => media.into(),
            RecordError::App(app) => app,
            RecordError::Store(store) => store.into(),
        }
    }
}
