use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::AvailabilityService;
use doctor_cell::DoctorError;
use shared_database::store::SLOT_TAKEN;
use shared_database::{AppointmentFilter, ClinicStore, StoreError};
use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::auth::Role;
use shared_models::payment::{Payment, PaymentStatus};
use shared_models::schedule::{TimeOfDay, TimeParseError};
use shared_models::user::UserAccount;
use shared_utils::validation::parse_date;
use shared_utils::AppState;

use crate::models::{AppointmentError, AppointmentQuery, BookAppointmentRequest, BookingResponse};
use crate::services::access::AppointmentAccess;
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct AppointmentBookingService {
    store: Arc<dyn ClinicStore>,
    availability: AvailabilityService,
    access: AppointmentAccess,
    lifecycle: AppointmentLifecycleService,
    payment_window: Duration,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            availability: AvailabilityService::new(state),
            access: AppointmentAccess::new(state.store.clone()),
            lifecycle: AppointmentLifecycleService::new(),
            payment_window: Duration::minutes(state.config.payment_window_minutes),
        }
    }

    fn parse_time(value: &str) -> Result<TimeOfDay, AppointmentError> {
        value
            .parse()
            .map_err(|e: TimeParseError| AppointmentError::Validation(e.to_string()))
    }

    /// Holds a slot for `patient` and opens the payment window.
    ///
    /// The requested range must be one of the doctor's resolved slots for the
    /// date. The store re-checks slot uniqueness inside the insert, so a
    /// concurrent booking of the same start loses with a conflict.
    pub async fn book_appointment(
        &self,
        patient: &UserAccount,
        request: BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingResponse, AppointmentError> {
        let date = parse_date(&request.date)?;
        let start_time = Self::parse_time(&request.start_time)?;
        let end_time = Self::parse_time(&request.end_time)?;

        if date < now.date_naive() {
            return Err(AppointmentError::Validation("Cannot book an appointment in the past".to_string()));
        }

        let doctor = self.store
            .find_doctor(request.doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)?;
        let doctor_active = self.store
            .find_user(doctor.user_id)
            .await?
            .is_some_and(|u| u.is_active);
        if !doctor_active {
            warn!("Booking attempted with inactive doctor {}", doctor.id);
            return Err(AppointmentError::DoctorInactive);
        }

        // Resolving also sweeps lapsed holds for this doctor and date.
        let schedule = self.availability.resolve_slots(doctor.id, date, now).await?;
        if let Some(message) = schedule.message {
            return Err(AppointmentError::Validation(message));
        }
        let slot = schedule
            .slots
            .iter()
            .find(|s| s.start_time == start_time && s.end_time == end_time)
            .ok_or(AppointmentError::NotASlot)?;
        if !slot.available {
            return Err(StoreError::Conflict(SLOT_TAKEN.to_string()).into());
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            doctor_id: doctor.id,
            date,
            start_time,
            end_time,
            status: AppointmentStatus::PendingPayment,
            token_number: None,
            token_status: None,
            created_at: now,
            updated_at: now,
        };
        let payment = Payment {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            user_id: patient.id,
            amount: doctor.consultation_fee,
            status: PaymentStatus::Pending,
            utr_number: None,
            screenshot_url: None,
            expires_at: now + self.payment_window,
            verified_by: None,
            verified_at: None,
            rejection_reason: None,
            created_at: now,
        };

        let (appointment, payment) = self.store.create_booking(appointment, payment).await?;
        info!(
            "Booked appointment {} with doctor {} on {} at {} (payment due {})",
            appointment.id, doctor.id, appointment.date, appointment.start_time, payment.expires_at
        );
        Ok(BookingResponse { appointment, payment })
    }

    pub async fn cancel_appointment(
        &self,
        actor: &UserAccount,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.access.load_for(actor, appointment_id).await?;

        // A lapsed hold is already gone; report it as such.
        self.store
            .expire_lapsed_bookings(appointment.doctor_id, appointment.date, now)
            .await?;
        let appointment = self.access.load(appointment_id).await?;

        if !self.lifecycle.can_cancel(appointment.status) {
            warn!("Refusing to cancel appointment {} in status {}", appointment.id, appointment.status);
            return Err(AppointmentError::NotCancellable(appointment.status));
        }

        let (appointment, payment) = self.store.cancel_booking(appointment.id, appointment.status, now).await?;
        info!(
            "Appointment {} cancelled by user {}, payment {:?}",
            appointment.id,
            actor.id,
            payment.map(|p| p.status)
        );
        Ok(appointment)
    }

    pub async fn get_appointment(&self, actor: &UserAccount, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.access.load_for(actor, appointment_id).await
    }

    /// Patients see their own bookings, doctors the bookings made with them,
    /// admins everything.
    pub async fn list_appointments(&self, actor: &UserAccount, query: AppointmentQuery) -> Result<Vec<Appointment>, AppointmentError> {
        let date = query.date.as_deref().map(parse_date).transpose()?;
        let mut filter = AppointmentFilter {
            date,
            status: query.status,
            ..Default::default()
        };

        match actor.role {
            Role::Admin => {}
            Role::Patient => filter.patient_id = Some(actor.id),
            Role::Doctor => match self.access.doctor_id_of(actor).await? {
                Some(doctor_id) => filter.doctor_id = Some(doctor_id),
                None => return Ok(Vec::new()),
            },
        }

        let appointments = self.store.list_appointments(filter).await?;
        debug!("Listed {} appointments for user {}", appointments.len(), actor.id);
        Ok(appointments)
    }
}
