use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::AppointmentError;
use shared_database::store::PAYMENT_PROCESSED;
use shared_database::{MediaError, StoreError};
use shared_models::appointment::Appointment;
use shared_models::error::AppError;
use shared_models::payment::{Payment, PaymentStatus};

pub const WINDOW_EXPIRED_MESSAGE: &str = "Payment window expired. Please book again.";
pub const PAYMENT_PROOF_FOLDER: &str = "clinic/payments";

#[derive(Debug, Deserialize)]
pub struct SubmitPaymentRequest {
    #[serde(alias = "appointmentId")]
    pub appointment_id: Uuid,
    #[serde(alias = "utrNumber")]
    pub utr_number: String,
    /// Proof of payment as a base64 data URI.
    pub screenshot: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub payment_id: Uuid,
    pub action: VerifyAction,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentQuery {
    pub status: Option<PaymentStatus>,
}

/// Payment and appointment after one paired transition.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    pub success: bool,
    pub payment: Payment,
    pub appointment: Appointment,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment record not found")]
    NotFound,

    #[error("Forbidden")]
    NotOwner,

    #[error("{}", PAYMENT_PROCESSED)]
    AlreadyProcessed,

    #[error("{}", WINDOW_EXPIRED_MESSAGE)]
    WindowExpired,

    #[error("Payment is not awaiting verification")]
    NotSubmitted,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound => AppError::NotFound(err.to_string()),
            PaymentError::NotOwner => AppError::Forbidden(err.to_string()),
            PaymentError::AlreadyProcessed
            | PaymentError::WindowExpired
            | PaymentError::NotSubmitted => AppError::Conflict(err.to_string()),
            PaymentError::Validation(msg) => AppError::ValidationError(msg),
            PaymentError::Media(media) => media.into(),
            PaymentError::Appointment(appointment) => appointment.into(),
            PaymentError::App(app) => app,
            PaymentError::Store(store) => store.into(),
        }
    }
}
