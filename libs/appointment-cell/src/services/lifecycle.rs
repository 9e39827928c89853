use tracing::{debug, warn};

use shared_models::appointment::AppointmentStatus;

use crate::models::AppointmentError;

/// Appointment state machine.
///
/// `PENDING_PAYMENT -> PAYMENT_SUBMITTED -> CONFIRMED -> ARRIVED -> COMPLETED | NO_SHOW`.
/// Payment moves drive the first two edges; clinic staff drive the rest.
/// `CANCELLED` and `EXPIRED` are absorbing.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Targets staff may set through the status endpoint.
    pub fn is_staff_target(status: AppointmentStatus) -> bool {
        matches!(
            status,
            AppointmentStatus::Arrived
                | AppointmentStatus::Completed
                | AppointmentStatus::NoShow
                | AppointmentStatus::Cancelled
        )
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::PendingPayment => vec![
                AppointmentStatus::PaymentSubmitted,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Expired,
            ],
            AppointmentStatus::PaymentSubmitted => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Arrived,
                AppointmentStatus::Completed,
                AppointmentStatus::NoShow,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Arrived => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Completed
            | AppointmentStatus::NoShow
            | AppointmentStatus::Cancelled
            | AppointmentStatus::Expired => vec![],
        }
    }

    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }
        Ok(())
    }

    pub fn can_cancel(&self, current_status: AppointmentStatus) -> bool {
        self.get_valid_transitions(current_status)
            .contains(&AppointmentStatus::Cancelled)
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
