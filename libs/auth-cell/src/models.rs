use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::user::UserProfile;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account has been disabled")]
    Disabled,

    #[error("Failed to issue session: {0}")]
    Session(String),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::EmailTaken => AppError::Conflict(err.to_string()),
            AccountError::InvalidCredentials => AppError::Auth(err.to_string()),
            AccountError::Disabled => AppError::Forbidden(err.to_string()),
            AccountError::Session(msg) => AppError::Internal(msg),
            AccountError::App(app) => app,
            AccountError::Store(StoreError::Conflict(_)) => {
                AppError::Conflict(AccountError::EmailTaken.to_string())
            }
            AccountError::Store(store) => store.into(),
        }
    }
}
