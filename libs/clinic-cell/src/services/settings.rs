use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_database::{ClinicStore, MediaFile, MediaStorage};
use shared_models::auth::Role;
use shared_models::clinic::ClinicSettings;
use shared_models::user::UserAccount;
use shared_utils::password::PasswordService;
use shared_utils::validation::{non_empty, require_email, require_min_len};
use shared_utils::AppState;

use crate::models::{ClinicError, SeedResponse, SettingsImageRequest, UpdateSettingsRequest};

pub struct SettingsService {
    config: Arc<AppConfig>,
    store: Arc<dyn ClinicStore>,
    media: Arc<dyn MediaStorage>,
}

impl SettingsService {
    pub fn new(state: &AppState) -> Self {
        Self {
            config: state.config.clone(),
            store: state.store.clone(),
            media: state.media.clone(),
        }
    }

    /// Saved settings, or defaults when the clinic has not been configured.
    pub async fn get_settings(&self) -> Result<ClinicSettings, ClinicError> {
        Ok(self.store.clinic_settings().await?.unwrap_or_default())
    }

    pub async fn update_settings(&self, request: UpdateSettingsRequest) -> Result<ClinicSettings, ClinicError> {
        require_min_len("Clinic name", &request.clinic_name, 1)?;
        let email = non_empty(request.email);
        if let Some(email) = &email {
            require_email(email)?;
        }

        let mut settings = self.get_settings().await?;
        settings.clinic_name = request.clinic_name.trim().to_string();
        settings.address = non_empty(request.address);
        settings.phone = non_empty(request.phone);
        settings.email = email;
        settings.upi_id = non_empty(request.upi_id);
        settings.about = non_empty(request.about);
        settings.updated_at = Utc::now();

        let settings = self.store.save_clinic_settings(settings).await?;
        info!("Clinic settings updated: {}", settings.clinic_name);
        Ok(settings)
    }

    pub async fn upload_image(&self, request: SettingsImageRequest) -> Result<ClinicSettings, ClinicError> {
        let file = MediaFile::from_data_uri(&request.file)?;
        let stored = self.media.upload(file, request.kind.folder()).await?;

        let mut settings = self.get_settings().await?;
        request.kind.apply(&mut settings, stored.url);
        settings.updated_at = Utc::now();

        let settings = self.store.save_clinic_settings(settings).await?;
        info!("Clinic {:?} image replaced", request.kind);
        Ok(settings)
    }

    /// One-shot bootstrap: the first admin plus default settings.
    pub async fn seed(&self) -> Result<SeedResponse, ClinicError> {
        if !self.store.list_users(Some(Role::Admin)).await?.is_empty() {
            warn!("Seed requested but an admin already exists");
            return Err(ClinicError::AdminExists);
        }

        let hash = PasswordService::hash_password(&self.config.seed_admin_password)?;
        let admin = UserAccount::new("Admin", self.config.seed_admin_email.to_lowercase(), None, hash, Role::Admin);
        let admin = self.store.insert_user(admin).await?;

        if self.store.clinic_settings().await?.is_none() {
            self.store.save_clinic_settings(ClinicSettings::default()).await?;
        }

        info!("Seeded admin account {}", admin.email);
        Ok(SeedResponse { success: true, admin: admin.profile() })
    }
}
