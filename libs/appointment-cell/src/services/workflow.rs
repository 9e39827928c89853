use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use shared_database::ClinicStore;
use shared_models::appointment::{Appointment, AppointmentStatus, TokenStatus};
use shared_models::user::UserAccount;
use shared_utils::AppState;

use crate::models::AppointmentError;
use crate::services::access::AppointmentAccess;
use crate::services::lifecycle::AppointmentLifecycleService;

/// Front-desk operations on a booked visit: status moves and queue tokens.
pub struct AppointmentWorkflowService {
    store: Arc<dyn ClinicStore>,
    access: AppointmentAccess,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentWorkflowService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            access: AppointmentAccess::new(state.store.clone()),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub async fn update_status(
        &self,
        actor: &UserAccount,
        appointment_id: Uuid,
        target: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        if !AppointmentLifecycleService::is_staff_target(target) {
            return Err(AppointmentError::Validation(
                "Status must be one of ARRIVED, COMPLETED, NO_SHOW, CANCELLED".to_string(),
            ));
        }

        let appointment = self.access.load_for(actor, appointment_id).await?;
        let mut appointment = self.settle(appointment, now).await?;
        self.lifecycle.validate_status_transition(appointment.status, target)?;

        let previous = appointment.status;
        let appointment = if target == AppointmentStatus::Cancelled {
            let (appointment, _) = self.store.cancel_booking(appointment.id, previous, now).await?;
            appointment
        } else {
            appointment.status = target;
            appointment.updated_at = now;
            self.store.update_appointment(appointment).await?
        };
        info!("Appointment {} moved {} -> {} by user {}", appointment.id, previous, target, actor.id);
        Ok(appointment)
    }

    pub async fn assign_token(
        &self,
        appointment_id: Uuid,
        token_number: i32,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        if token_number < 1 {
            return Err(AppointmentError::Validation("Token number must be a positive integer".to_string()));
        }

        let appointment = self.access.load(appointment_id).await?;
        let mut appointment = self.settle(appointment, now).await?;
        if !appointment.status.holds_slot() {
            warn!("Token requested for appointment {} in status {}", appointment.id, appointment.status);
            return Err(AppointmentError::Inactive(appointment.status));
        }

        appointment.token_number = Some(token_number);
        appointment.token_status = Some(TokenStatus::Assigned);
        appointment.updated_at = now;
        let appointment = self.store.update_appointment(appointment).await?;
        info!("Token {} assigned to appointment {}", token_number, appointment.id);
        Ok(appointment)
    }

    pub async fn update_token(
        &self,
        actor: &UserAccount,
        appointment_id: Uuid,
        token_status: TokenStatus,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.access.load_for(actor, appointment_id).await?;
        let mut appointment = self.settle(appointment, now).await?;
        if !appointment.status.holds_slot() {
            warn!("Token update for appointment {} in status {}", appointment.id, appointment.status);
            return Err(AppointmentError::Inactive(appointment.status));
        }
        if appointment.token_number.is_none() {
            return Err(AppointmentError::TokenNotAssigned);
        }

        appointment.token_status = Some(token_status);
        appointment.updated_at = now;
        let appointment = self.store.update_appointment(appointment).await?;
        info!("Token for appointment {} is now {}", appointment.id, token_status);
        Ok(appointment)
    }

    /// Materializes a lapsed payment window on the appointment's day and
    /// returns the row as it now stands.
    async fn settle(&self, appointment: Appointment, now: DateTime<Utc>) -> Result<Appointment, AppointmentError> {
        let expired = self.store
            .expire_lapsed_bookings(appointment.doctor_id, appointment.date, now)
            .await?;
        if expired == 0 {
            return Ok(appointment);
        }
        self.access.load(appointment.id).await
    }
}
