use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::AppointmentAccess;
use shared_database::{ClinicStore, MediaFile, MediaStorage, PaymentTransition};
use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::payment::{Payment, PaymentStatus};
use shared_models::user::UserAccount;
use shared_utils::validation::{non_empty, require_min_len};
use shared_utils::AppState;

use crate::models::{
    PaymentError, PaymentOutcome, PaymentQuery, SubmitPaymentRequest, VerifyAction, VerifyPaymentRequest,
    PAYMENT_PROOF_FOLDER,
};

/// Manual (UPI reference) payment flow.
///
/// Every status change goes through [`ClinicStore::apply_payment_transition`],
/// which only succeeds while the stored payment is still in the state this
/// service read, so two admins verifying the same payment cannot both win.
pub struct PaymentService {
    store: Arc<dyn ClinicStore>,
    media: Arc<dyn MediaStorage>,
    access: AppointmentAccess,
}

impl PaymentService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            media: state.media.clone(),
            access: AppointmentAccess::new(state.store.clone()),
        }
    }

    async fn payment_for(&self, appointment_id: Uuid) -> Result<Payment, PaymentError> {
        self.store
            .find_payment_for_appointment(appointment_id)
            .await?
            .ok_or(PaymentError::NotFound)
    }

    /// Moves a lapsed hold to EXPIRED on both rows.
    async fn expire(&self, payment: Payment) -> Result<(), PaymentError> {
        let mut expired = payment;
        expired.status = PaymentStatus::Expired;
        self.store
            .apply_payment_transition(PaymentTransition {
                payment: expired,
                expected: PaymentStatus::Pending,
                appointment_from: AppointmentStatus::PendingPayment,
                appointment_to: AppointmentStatus::Expired,
            })
            .await?;
        Ok(())
    }

    pub async fn submit_payment(
        &self,
        patient: &UserAccount,
        request: SubmitPaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome, PaymentError> {
        require_min_len("UTR number", &request.utr_number, 6)?;

        let payment = self.payment_for(request.appointment_id).await?;
        if payment.user_id != patient.id {
            warn!("User {} tried to pay for appointment {}", patient.id, request.appointment_id);
            return Err(PaymentError::NotOwner);
        }

        match payment.status {
            PaymentStatus::Pending => {}
            PaymentStatus::Expired => return Err(PaymentError::WindowExpired),
            _ => return Err(PaymentError::AlreadyProcessed),
        }
        if payment.is_lapsed(now) {
            info!("Payment {} lapsed at {}, expiring hold", payment.id, payment.expires_at);
            self.expire(payment).await?;
            return Err(PaymentError::WindowExpired);
        }

        // A cancelled or expired appointment cannot take a proof of payment.
        let appointment = self.access.load(payment.appointment_id).await?;
        if appointment.status != AppointmentStatus::PendingPayment {
            warn!("Payment {} submitted while appointment is {}", payment.id, appointment.status);
            return Err(PaymentError::AlreadyProcessed);
        }

        let stored = match non_empty(request.screenshot) {
            Some(data) => {
                let file = MediaFile::from_data_uri(&data)?;
                Some(self.media.upload(file, PAYMENT_PROOF_FOLDER).await?)
            }
            None => None,
        };

        let mut submitted = payment;
        submitted.status = PaymentStatus::Submitted;
        submitted.utr_number = Some(request.utr_number.trim().to_string());
        submitted.screenshot_url = stored.as_ref().map(|media| media.url.clone());

        let transition = self.store
            .apply_payment_transition(PaymentTransition {
                payment: submitted,
                expected: PaymentStatus::Pending,
                appointment_from: AppointmentStatus::PendingPayment,
                appointment_to: AppointmentStatus::PaymentSubmitted,
            })
            .await;
        let (payment, appointment) = match transition {
            Ok(rows) => rows,
            Err(err) => {
                if let Some(media) = stored {
                    if let Err(cleanup) = self.media.delete(&media.public_id).await {
                        warn!("Could not remove payment proof {}: {}", media.public_id, cleanup);
                    }
                }
                return Err(err.into());
            }
        };
        info!("Payment {} submitted for appointment {}", payment.id, appointment.id);
        Ok(PaymentOutcome { success: true, payment, appointment })
    }

    pub async fn verify_payment(
        &self,
        admin: &UserAccount,
        request: VerifyPaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome, PaymentError> {
        let reason = non_empty(request.reason);
        if request.action == VerifyAction::Reject && reason.is_none() {
            return Err(PaymentError::Validation("Rejection reason is required".to_string()));
        }

        let payment = self.store
            .find_payment(request.payment_id)
            .await?
            .ok_or(PaymentError::NotFound)?;
        if payment.status != PaymentStatus::Submitted {
            warn!("Payment {} verified while {}", payment.id, payment.status);
            return Err(PaymentError::NotSubmitted);
        }

        let mut decided = payment;
        decided.verified_by = Some(admin.id);
        decided.verified_at = Some(now);
        let appointment_to = match request.action {
            VerifyAction::Approve => {
                decided.status = PaymentStatus::Verified;
                AppointmentStatus::Confirmed
            }
            VerifyAction::Reject => {
                decided.status = PaymentStatus::Rejected;
                decided.rejection_reason = reason;
                AppointmentStatus::Cancelled
            }
        };

        let (payment, appointment) = self.store
            .apply_payment_transition(PaymentTransition {
                payment: decided,
                expected: PaymentStatus::Submitted,
                appointment_from: AppointmentStatus::PaymentSubmitted,
                appointment_to,
            })
            .await?;
        info!(
            "Payment {} {} by admin {}; appointment {} is {}",
            payment.id, payment.status, admin.id, appointment.id, appointment.status
        );
        Ok(PaymentOutcome { success: true, payment, appointment })
    }

    /// Payment for an appointment the caller can see.
    pub async fn payment_for_appointment(&self, actor: &UserAccount, appointment_id: Uuid) -> Result<(Payment, Appointment), PaymentError> {
        let appointment = self.access.load_for(actor, appointment_id).await?;
        let payment = self.payment_for(appointment.id).await?;
        Ok((payment, appointment))
    }

    pub async fn list_payments(&self, query: PaymentQuery) -> Result<Vec<Payment>, PaymentError> {
        let payments = self.store.list_payments(query.status).await?;
        debug!("Listed {} payments", payments.len());
        Ok(payments)
    }
}
