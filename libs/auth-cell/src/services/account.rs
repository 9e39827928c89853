use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::ClinicStore;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_models::user::UserAccount;
use shared_utils::jwt::issue_token;
use shared_utils::password::PasswordService;
use shared_utils::state::AppState;
use shared_utils::validation::{non_empty, require_email, require_min_len};

use crate::models::{AccountError, LoginRequest, RegisterRequest};

pub struct AccountService {
    store: Arc<dyn ClinicStore>,
    jwt_secret: String,
    session_ttl: Duration,
}

impl AccountService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            jwt_secret: state.config.jwt_secret.clone(),
            session_ttl: state.session_ttl(),
        }
    }

    fn validate_registration(request: &RegisterRequest) -> Result<(), AppError> {
        require_min_len("Name", &request.name, 2)?;
        require_email(request.email.trim())?;
        if let Some(phone) = request.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            if phone.trim().chars().count() < 10 {
                return Err(AppError::ValidationError("Phone must be at least 10 digits".to_string()));
            }
        }
        if request.password.chars().count() < 6 {
            return Err(AppError::ValidationError("Password must be at least 6 characters".to_string()));
        }
        Ok(())
    }

    pub fn issue_session(&self, user: &UserAccount) -> Result<String, AccountError> {
        issue_token(&user.session(), &self.jwt_secret, self.session_ttl)
            .map_err(|e| AccountError::Session(e.to_string()))
    }

    /// Creates a PATIENT account and opens a session for it.
    pub async fn register(&self, request: RegisterRequest) -> Result<(UserAccount, String), AccountError> {
        Self::validate_registration(&request)?;

        let email = request.email.trim().to_lowercase();
        if self.store.find_user_by_email(&email).await?.is_some() {
            debug!("Registration rejected, email in use: {}", email);
            return Err(AccountError::EmailTaken);
        }

        let hash = PasswordService::hash_password(&request.password)?;
        let user = UserAccount::new(
            request.name.trim(),
            email,
            non_empty(request.phone),
            hash,
            Role::Patient,
        );
        let user = self.store.insert_user(user).await?;
        info!("Registered patient {}", user.id);

        let token = self.issue_session(&user)?;
        Ok((user, token))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<(UserAccount, String), AccountError> {
        require_email(request.email.trim())?;
        require_min_len("Password", &request.password, 1)?;

        let user = self.store
            .find_user_by_email(request.email.trim())
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !PasswordService::verify_password(&request.password, &user.password_hash) {
            warn!("Failed login for {}", user.email);
            return Err(AccountError::InvalidCredentials);
        }
        if !user.is_active {
            warn!("Login attempt on disabled account {}", user.id);
            return Err(AccountError::Disabled);
        }

        info!("User {} logged in as {}", user.id, user.role);
        let token = self.issue_session(&user)?;
        Ok((user, token))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserAccount, AccountError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AccountError::App(AppError::NotFound("User not found".to_string())))
    }
}
