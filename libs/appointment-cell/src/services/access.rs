use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use shared_database::ClinicStore;
use shared_models::appointment::Appointment;
use shared_models::auth::Role;
use shared_models::user::UserAccount;

use crate::models::AppointmentError;

/// Decides who may see or touch an appointment: its patient, the doctor it is
/// booked with, or any admin.
pub struct AppointmentAccess {
    store: Arc<dyn ClinicStore>,
}

impl AppointmentAccess {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    /// Doctor profile id owned by `actor`, if any.
    pub async fn doctor_id_of(&self, actor: &UserAccount) -> Result<Option<Uuid>, AppointmentError> {
        if actor.role != Role::Doctor {
            return Ok(None);
        }
        Ok(self.store.find_doctor_by_user(actor.id).await?.map(|d| d.id))
    }

    pub async fn is_participant(&self, actor: &UserAccount, appointment: &Appointment) -> Result<bool, AppointmentError> {
        Ok(match actor.role {
            Role::Admin => true,
            Role::Patient => appointment.patient_id == actor.id,
            Role::Doctor => self.doctor_id_of(actor).await? == Some(appointment.doctor_id),
        })
    }

    pub async fn ensure_participant(&self, actor: &UserAccount, appointment: &Appointment) -> Result<(), AppointmentError> {
        if self.is_participant(actor, appointment).await? {
            Ok(())
        } else {
            warn!("User {} denied access to appointment {}", actor.id, appointment.id);
            Err(AppointmentError::NotParticipant)
        }
    }

    pub async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .find_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    /// Loads the appointment and checks `actor` may access it.
    pub async fn load_for(&self, actor: &UserAccount, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        self.ensure_participant(actor, &appointment).await?;
        Ok(appointment)
    }
}
