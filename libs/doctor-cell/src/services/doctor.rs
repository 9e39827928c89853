use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{ClinicStore, StoreError};
use shared_models::auth::Role;
use shared_models::doctor::Doctor;
use shared_models::user::UserAccount;
use shared_utils::password::PasswordService;
use shared_utils::validation::{non_empty, require_email, require_min_len};
use shared_utils::AppState;

use crate::models::{
    CreateDoctorRequest, DoctorError, DoctorProfile, PublicDoctor, UpdateDoctorRequest, WeeklyWindow,
};

pub struct DoctorService {
    store: Arc<dyn ClinicStore>,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    fn validate_profile(specialization: &str, qualification: &str, experience_years: i32, fee: f64) -> Result<(), DoctorError> {
        require_min_len("Specialization", specialization, 2)?;
        require_min_len("Qualification", qualification, 2)?;
        if experience_years < 0 {
            return Err(DoctorError::Validation("Experience cannot be negative".to_string()));
        }
        if !fee.is_finite() || fee < 0.0 {
            return Err(DoctorError::Validation("Consultation fee cannot be negative".to_string()));
        }
        Ok(())
    }

    async fn account_for(&self, doctor: &Doctor) -> Result<UserAccount, DoctorError> {
        self.store
            .find_user(doctor.user_id)
            .await?
            .ok_or_else(|| DoctorError::Store(StoreError::Backend(format!("Doctor {} has no account", doctor.id))))
    }

    async fn profile(&self, doctor: Doctor) -> Result<DoctorProfile, DoctorError> {
        let user = self.account_for(&doctor).await?;
        Ok(DoctorProfile::from_parts(&user, &doctor))
    }

    pub async fn add_doctor(&self, request: CreateDoctorRequest) -> Result<DoctorProfile, DoctorError> {
        require_min_len("Name", &request.name, 2)?;
        require_email(request.email.trim())?;
        if request.password.chars().count() < 6 {
            return Err(DoctorError::Validation("Password must be at least 6 characters".to_string()));
        }
        Self::validate_profile(&request.specialization, &request.qualification, request.experience_years, request.consultation_fee)?;

        let email = request.email.trim().to_lowercase();
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(DoctorError::EmailTaken);
        }

        let hash = PasswordService::hash_password(&request.password)?;
        let user = UserAccount::new(request.name.trim(), email, non_empty(request.phone), hash, Role::Doctor);
        let doctor = Doctor {
            id: Uuid::new_v4(),
            user_id: user.id,
            specialization: request.specialization.trim().to_string(),
            qualification: request.qualification.trim().to_string(),
            experience_years: request.experience_years,
            consultation_fee: request.consultation_fee,
            bio: non_empty(request.bio),
            created_at: Utc::now(),
        };

        let (user, doctor) = self.store.insert_doctor(user, doctor).await.map_err(|e| match e {
            StoreError::Conflict(_) => DoctorError::EmailTaken,
            other => other.into(),
        })?;
        info!("Added doctor {} ({})", doctor.id, user.email);
        Ok(DoctorProfile::from_parts(&user, &doctor))
    }

    pub async fn update_doctor(&self, doctor_id: Uuid, request: UpdateDoctorRequest) -> Result<DoctorProfile, DoctorError> {
        require_min_len("Name", &request.name, 2)?;
        Self::validate_profile(&request.specialization, &request.qualification, request.experience_years, request.consultation_fee)?;

        let mut doctor = self.get(doctor_id).await?;
        doctor.specialization = request.specialization.trim().to_string();
        doctor.qualification = request.qualification.trim().to_string();
        doctor.experience_years = request.experience_years;
        doctor.consultation_fee = request.consultation_fee;
        doctor.bio = non_empty(request.bio);

        let (user, doctor) = self.store
            .update_doctor(doctor, request.name.trim().to_string(), non_empty(request.phone))
            .await?;
        info!("Updated doctor {}", doctor.id);
        Ok(DoctorProfile::from_parts(&user, &doctor))
    }

    /// Deactivates the doctor's account. Rows are kept for history.
    pub async fn remove_doctor(&self, doctor_id: Uuid) -> Result<DoctorProfile, DoctorError> {
        let doctor = self.get(doctor_id).await?;
        let user = self.store.set_user_active(doctor.user_id, false).await?;
        warn!("Deactivated doctor {} (user {})", doctor.id, user.id);
        Ok(DoctorProfile::from_parts(&user, &doctor))
    }

    pub async fn get(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        self.store.find_doctor(doctor_id).await?.ok_or(DoctorError::NotFound)
    }

    pub async fn get_profile(&self, doctor_id: Uuid) -> Result<DoctorProfile, DoctorError> {
        let doctor = self.get(doctor_id).await?;
        self.profile(doctor).await
    }

    pub async fn profile_for_user(&self, user_id: Uuid) -> Result<DoctorProfile, DoctorError> {
        let doctor = self.store.find_doctor_by_user(user_id).await?.ok_or(DoctorError::NotFound)?;
        self.profile(doctor).await
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorProfile>, DoctorError> {
        let doctors = self.store.list_doctors().await?;
        debug!("Listing {} doctors", doctors.len());
        try_join_all(doctors.into_iter().map(|d| self.profile(d))).await
    }

    /// Active doctors with their active weekly windows.
    pub async fn public_directory(&self) -> Result<Vec<PublicDoctor>, DoctorError> {
        let profiles = self.list_doctors().await?;

        let entries = profiles.into_iter().filter(|p| p.is_active).map(|profile| async move {
            let availability = self.store
                .list_availability(profile.id)
                .await?
                .iter()
                .filter(|rule| rule.is_active)
                .map(WeeklyWindow::from)
                .collect();
            Ok::<_, DoctorError>(PublicDoctor {
                id: profile.id,
                name: profile.name,
                specialization: profile.specialization,
                qualification: profile.qualification,
                experience_years: profile.experience_years,
                consultation_fee: profile.consultation_fee,
                bio: profile.bio,
                availability,
            })
        });

        let mut directory = try_join_all(entries).await?;
        directory.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(directory)
    }
}
