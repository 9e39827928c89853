use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_database::ClinicStore;
use shared_models::auth::Role;
use shared_models::user::{UserAccount, UserProfile};
use shared_utils::AppState;

use crate::models::PatientError;

pub struct PatientService {
    store: Arc<dyn ClinicStore>,
}

impl PatientService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn list_patients(&self) -> Result<Vec<UserProfile>, PatientError> {
        let patients = self.store.list_users(Some(Role::Patient)).await?;
        debug!("Listing {} patients", patients.len());
        Ok(patients.iter().map(UserAccount::profile).collect())
    }

    /// Bans or restores any account. Takes effect on the user's next request.
    pub async fn toggle_status(&self, admin: &UserAccount, user_id: Uuid) -> Result<UserProfile, PatientError> {
        if admin.id == user_id {
            return Err(PatientError::SelfToggle);
        }

        let user = self.store.find_user(user_id).await?.ok_or(PatientError::NotFound)?;
        let user = self.store.set_user_active(user.id, !user.is_active).await?;
        info!(
            "User {} is now {} (changed by admin {})",
            user.id,
            if user.is_active { "active" } else { "disabled" },
            admin.id
        );
        Ok(user.profile())
    }
}
