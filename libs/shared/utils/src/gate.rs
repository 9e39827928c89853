use std::sync::Arc;

use tracing::{debug, warn};

use shared_database::ClinicStore;
use shared_models::auth::{Role, SessionUser};
use shared_models::error::AppError;
use shared_models::user::UserAccount;

use crate::state::AppState;

/// Role check plus a live lookup of the account behind a session, so a
/// deactivated user's unexpired token stops working immediately.
pub struct SessionGate {
    store: Arc<dyn ClinicStore>,
}

impl SessionGate {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    /// Checks, in order: a session exists, its role is in `roles` (empty
    /// means any role), and the backing account still exists and is active.
    pub async fn authorize(&self, session: Option<&SessionUser>, roles: &[Role]) -> Result<UserAccount, AppError> {
        let session = session.ok_or_else(|| AppError::Auth("Unauthorized".to_string()))?;

        if !roles.is_empty() && !roles.contains(&session.role) {
            debug!("User {} with role {} denied; requires {:?}", session.id, session.role, roles);
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        let account = self.store.find_user(session.id).await?;
        match account {
            Some(account) if account.is_active => Ok(account),
            _ => {
                warn!("Rejected session for disabled or missing user {}", session.id);
                Err(AppError::Auth("Account disabled".to_string()))
            }
        }
    }

    pub async fn require(&self, session: &SessionUser, roles: &[Role]) -> Result<UserAccount, AppError> {
        self.authorize(Some(session), roles).await
    }
}
