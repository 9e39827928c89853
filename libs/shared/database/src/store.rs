use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::auth::Role;
use shared_models::clinic::{ClinicSettings, GalleryImage};
use shared_models::doctor::{Doctor, DoctorAvailability, Holiday};
use shared_models::error::AppError;
use shared_models::payment::{Payment, PaymentStatus};
use shared_models::record::{MedicalRecord, Prescription};
use shared_models::user::UserAccount;

use crate::supabase::SupabaseError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Backend(msg) => AppError::Database(msg),
        }
    }
}

impl From<SupabaseError> for StoreError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Api { status: 409, message } => StoreError::Conflict(message),
            SupabaseError::Api { status: 404, message } => StoreError::NotFound(message),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(format!("Malformed row: {}", err))
    }
}

/// Row filter for appointment listings. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.doctor_id.map_or(true, |id| appointment.doctor_id == id)
            && self.date.map_or(true, |date| appointment.date == date)
            && self.status.map_or(true, |status| appointment.status == status)
    }
}

/// A paired payment/appointment status change applied as one compare-and-set.
///
/// The store rejects the change with [`StoreError::Conflict`] unless the
/// stored payment is still in `expected` and the appointment is still in
/// `appointment_from`.
#[derive(Debug, Clone)]
pub struct PaymentTransition {
    pub payment: Payment,
    pub expected: PaymentStatus,
    pub appointment_from: AppointmentStatus,
    pub appointment_to: AppointmentStatus,
}

pub const SLOT_TAKEN: &str = "This slot is no longer available";
pub const PAYMENT_PROCESSED: &str = "Payment already processed";
pub const CANCELLED_PAYMENT_REASON: &str = "Appointment cancelled";

/// Relational store behind every cell. Multi-row writes are atomic.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    // Users
    async fn insert_user(&self, user: UserAccount) -> StoreResult<UserAccount>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserAccount>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>>;
    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<UserAccount>>;
    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<UserAccount>;

    // Doctors
    async fn insert_doctor(&self, user: UserAccount, doctor: Doctor) -> StoreResult<(UserAccount, Doctor)>;
    async fn update_doctor(&self, doctor: Doctor, name: String, phone: Option<String>) -> StoreResult<(UserAccount, Doctor)>;
    async fn find_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>>;
    async fn find_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>>;
    async fn list_doctors(&self) -> StoreResult<Vec<Doctor>>;

    // Weekly schedules
    async fn upsert_availability(&self, rule: DoctorAvailability) -> StoreResult<DoctorAvailability>;
    async fn find_availability(&self, doctor_id: Uuid, day_of_week: u8) -> StoreResult<Option<DoctorAvailability>>;
    async fn list_availability(&self, doctor_id: Uuid) -> StoreResult<Vec<DoctorAvailability>>;
    async fn set_availability_active(&self, doctor_id: Uuid, day_of_week: u8, active: bool) -> StoreResult<DoctorAvailability>;

    // Holidays
    async fn insert_holiday(&self, holiday: Holiday) -> StoreResult<Holiday>;
    async fn delete_holiday(&self, id: Uuid) -> StoreResult<()>;
    async fn find_holiday_on(&self, date: NaiveDate) -> StoreResult<Option<Holiday>>;
    async fn list_holidays(&self) -> StoreResult<Vec<Holiday>>;

    // Appointments
    /// Inserts the appointment and its payment together. Fails with
    /// [`StoreError::Conflict`] when another live appointment holds the slot.
    async fn create_booking(&self, appointment: Appointment, payment: Payment) -> StoreResult<(Appointment, Payment)>;
    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>>;
    async fn list_appointments(&self, filter: AppointmentFilter) -> StoreResult<Vec<Appointment>>;
    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment>;
    /// Cancels the appointment while it is still `expected` and closes its
    /// payment in the same write: PENDING becomes EXPIRED, SUBMITTED becomes
    /// REJECTED with [`CANCELLED_PAYMENT_REASON`]. Settled payments are kept.
    async fn cancel_booking(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<(Appointment, Option<Payment>)>;

    // Payments
    async fn find_payment(&self, id: Uuid) -> StoreResult<Option<Payment>>;
    async fn find_payment_for_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Payment>>;
    async fn list_payments(&self, status: Option<PaymentStatus>) -> StoreResult<Vec<Payment>>;
    async fn apply_payment_transition(&self, transition: PaymentTransition) -> StoreResult<(Payment, Appointment)>;
    /// Moves every lapsed PENDING payment of the doctor's day, and its
    /// PENDING_PAYMENT appointment, to EXPIRED. Returns how many were expired.
    async fn expire_lapsed_bookings(&self, doctor_id: Uuid, date: NaiveDate, now: DateTime<Utc>) -> StoreResult<usize>;

    // Records
    /// Upserts the prescription by appointment and appends the record.
    async fn save_prescription(&self, prescription: Prescription, record: MedicalRecord) -> StoreResult<(Prescription, MedicalRecord)>;
    async fn find_prescription(&self, appointment_id: Uuid) -> StoreResult<Option<Prescription>>;
    async fn find_medical_record(&self, id: Uuid) -> StoreResult<Option<MedicalRecord>>;
    async fn list_medical_records(&self, patient_id: Uuid) -> StoreResult<Vec<MedicalRecord>>;
    async fn add_record_attachment(&self, record_id: Uuid, url: String) -> StoreResult<MedicalRecord>;

    // Clinic content
    async fn clinic_settings(&self) -> StoreResult<Option<ClinicSettings>>;
    async fn save_clinic_settings(&self, settings: ClinicSettings) -> StoreResult<ClinicSettings>;
    async fn insert_gallery_image(&self, image: GalleryImage) -> StoreResult<GalleryImage>;
    async fn find_gallery_image(&self, id: Uuid) -> StoreResult<Option<GalleryImage>>;
    async fn delete_gallery_image(&self, id: Uuid) -> StoreResult<()>;
    async fn list_gallery_images(&self) -> StoreResult<Vec<GalleryImage>>;
}
