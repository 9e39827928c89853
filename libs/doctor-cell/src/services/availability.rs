use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{AppointmentFilter, ClinicStore};
use shared_models::auth::Role;
use shared_models::doctor::{Doctor, DoctorAvailability, DEFAULT_SLOT_DURATION};
use shared_models::schedule::{day_of_week, DaySchedule, SlotAvailability, TimeOfDay};
use shared_models::user::UserAccount;
use shared_utils::AppState;

use crate::models::{DoctorError, SetAvailabilityRequest, NOT_WORKING_MESSAGE};
use crate::services::slots::generate_slots;

pub struct AvailabilityService {
    store: Arc<dyn ClinicStore>,
}

impl AvailabilityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    async fn doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        self.store.find_doctor(doctor_id).await?.ok_or(DoctorError::NotFound)
    }

    fn closed(doctor_id: Uuid, date: NaiveDate, message: String) -> DaySchedule {
        DaySchedule {
            doctor_id,
            date,
            slots: Vec::new(),
            message: Some(message),
        }
    }

    /// Bookable slots for one doctor on one date.
    ///
    /// A missing or inactive weekly rule wins over a holiday. Lapsed payment
    /// holds for the day are expired first so they do not block slots.
    pub async fn resolve_slots(&self, doctor_id: Uuid, date: NaiveDate, now: DateTime<Utc>) -> Result<DaySchedule, DoctorError> {
        let doctor = self.doctor(doctor_id).await?;
        let day = day_of_week(date);

        let rule = match self.store.find_availability(doctor.id, day).await? {
            Some(rule) if rule.is_active => rule,
            _ => {
                debug!("Doctor {} has no active rule for day {}", doctor.id, day);
                return Ok(Self::closed(doctor.id, date, NOT_WORKING_MESSAGE.to_string()));
            }
        };

        if let Some(holiday) = self.store.find_holiday_on(date).await? {
            let reason = holiday.reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "Clinic closed".to_string());
            return Ok(Self::closed(doctor.id, date, format!("Holiday: {}", reason)));
        }

        let slots = generate_slots(rule.start_time, rule.end_time, rule.slot_duration);

        self.store.expire_lapsed_bookings(doctor.id, date, now).await?;
        let booked: HashSet<TimeOfDay> = self.store
            .list_appointments(AppointmentFilter {
                doctor_id: Some(doctor.id),
                date: Some(date),
                ..Default::default()
            })
            .await?
            .into_iter()
            .filter(|a| a.status.holds_slot())
            .map(|a| a.start_time)
            .collect();

        let slots = slots
            .into_iter()
            .map(|slot| SlotAvailability {
                start_time: slot.start,
                end_time: slot.end,
                available: !booked.contains(&slot.start),
            })
            .collect();

        Ok(DaySchedule {
            doctor_id: doctor.id,
            date,
            slots,
            message: None,
        })
    }

    /// Admins manage any schedule; doctors only their own.
    pub async fn ensure_manages(&self, actor: &UserAccount, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let doctor = self.doctor(doctor_id).await?;
        match actor.role {
            Role::Admin => Ok(doctor),
            Role::Doctor if doctor.user_id == actor.id => Ok(doctor),
            _ => Err(DoctorError::NotOwner),
        }
    }

    pub async fn set_availability(&self, doctor_id: Uuid, request: SetAvailabilityRequest) -> Result<DoctorAvailability, DoctorError> {
        if request.day_of_week > 6 {
            return Err(DoctorError::Validation(
                "Day of week must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }

        let start_time: TimeOfDay = request.start_time.parse()
            .map_err(|e: shared_models::schedule::TimeParseError| DoctorError::Validation(e.to_string()))?;
        let end_time: TimeOfDay = request.end_time.parse()
            .map_err(|e: shared_models::schedule::TimeParseError| DoctorError::Validation(e.to_string()))?;
        if start_time >= end_time {
            return Err(DoctorError::Validation("Start time must be before end time".to_string()));
        }

        let slot_duration = request.slot_duration.unwrap_or(DEFAULT_SLOT_DURATION);
        if !(10..=120).contains(&slot_duration) {
            return Err(DoctorError::Validation(
                "Slot duration must be between 10 and 120 minutes".to_string(),
            ));
        }

        let rule = DoctorAvailability {
            id: Uuid::new_v4(),
            doctor_id,
            day_of_week: request.day_of_week,
            start_time,
            end_time,
            slot_duration,
            is_active: true,
        };
        let rule = self.store.upsert_availability(rule).await?;
        info!(
            "Doctor {} availability for day {} set to {}-{} every {} min",
            doctor_id, rule.day_of_week, rule.start_time, rule.end_time, rule.slot_duration
        );
        Ok(rule)
    }

    pub async fn deactivate_day(&self, doctor_id: Uuid, day_of_week: u8) -> Result<DoctorAvailability, DoctorError> {
        let rule = self.store.set_availability_active(doctor_id, day_of_week, false).await?;
        info!("Doctor {} no longer works on day {}", doctor_id, day_of_week);
        Ok(rule)
    }

    pub async fn weekly_schedule(&self, doctor_id: Uuid) -> Result<Vec<DoctorAvailability>, DoctorError> {
        let doctor = self.doctor(doctor_id).await?;
        Ok(self.store.list_availability(doctor.id).await?)
    }
}
