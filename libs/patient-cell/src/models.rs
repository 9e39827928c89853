use serde::Serialize;
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::user::UserProfile;

#[derive(Debug, Clone, Serialize)]
pub struct StatusToggle {
    pub success: bool,
    pub user: UserProfile,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("User not found")]
    NotFound,

    #[error("You cannot change your own account status")]
    SelfToggle,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::SelfToggle => AppError::ValidationError(err.to_string()),
            PatientError::Store(store) => store.into(),
        }
    }
}
