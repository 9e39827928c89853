use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::auth::Role;
use shared_models::clinic::{ClinicSettings, GalleryImage};
use shared_models::doctor::{Doctor, DoctorAvailability, Holiday};
use shared_models::payment::{Payment, PaymentStatus};
use shared_models::record::{MedicalRecord, Prescription};
use shared_models::user::UserAccount;

use crate::store::{
    AppointmentFilter, ClinicStore, PaymentTransition, StoreError, StoreResult,
    CANCELLED_PAYMENT_REASON, PAYMENT_PROCESSED, SLOT_TAKEN,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, UserAccount>,
    doctors: HashMap<Uuid, Doctor>,
    availability: HashMap<(Uuid, u8), DoctorAvailability>,
    holidays: HashMap<Uuid, Holiday>,
    appointments: HashMap<Uuid, Appointment>,
    payments: HashMap<Uuid, Payment>,
    prescriptions: HashMap<Uuid, Prescription>,
    records: Vec<MedicalRecord>,
    settings: Option<ClinicSettings>,
    gallery: HashMap<Uuid, GalleryImage>,
}

impl Tables {
    fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|u| u.email.eq_ignore_ascii_case(email))
    }

    fn appointment_mut(&mut self, id: Uuid) -> StoreResult<&mut Appointment> {
        self.appointments
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Appointment not found".to_string()))
    }
}

/// Process-local store. Every operation takes the single table lock, so
/// multi-row writes are atomic with respect to each other.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl ClinicStore for InMemoryStore {
    async fn insert_user(&self, user: UserAccount) -> StoreResult<UserAccount> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<UserAccount>> {
        let tables = self.tables.read().await;
        let users = tables.users.values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        Ok(newest_first(users, |u: &UserAccount| u.created_at))
    }

    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<UserAccount> {
        let mut tables = self.tables.write().await;
        let user = tables.users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("User not found".to_string()))?;
        user.is_active = active;
        Ok(user.clone())
    }

    async fn insert_doctor(&self, user: UserAccount, doctor: Doctor) -> StoreResult<(UserAccount, Doctor)> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email) {
            return Err(StoreError::Conflict("Email already in use".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        tables.doctors.insert(doctor.id, doctor.clone());
        Ok((user, doctor))
    }

    async fn update_doctor(&self, doctor: Doctor, name: String, phone: Option<String>) -> StoreResult<(UserAccount, Doctor)> {
        let mut tables = self.tables.write().await;
        if !tables.doctors.contains_key(&doctor.id) {
            return Err(StoreError::NotFound("Doctor not found".to_string()));
        }
        let user = tables.users
            .get_mut(&doctor.user_id)
            .ok_or_else(|| StoreError::NotFound("User not found".to_string()))?;
        user.name = name;
        user.phone = phone;
        let user = user.clone();
        tables.doctors.insert(doctor.id, doctor.clone());
        Ok((user, doctor))
    }

    async fn find_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>> {
        Ok(self.tables.read().await.doctors.get(&id).cloned())
    }

    async fn find_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.values().find(|d| d.user_id == user_id).cloned())
    }

    async fn list_doctors(&self) -> StoreResult<Vec<Doctor>> {
        let doctors = self.tables.read().await.doctors.values().cloned().collect();
        Ok(newest_first(doctors, |d: &Doctor| d.created_at))
    }

    async fn upsert_availability(&self, mut rule: DoctorAvailability) -> StoreResult<DoctorAvailability> {
        let mut tables = self.tables.write().await;
        let key = (rule.doctor_id, rule.day_of_week);
        if let Some(existing) = tables.availability.get(&key) {
            rule.id = existing.id;
        }
        tables.availability.insert(key, rule.clone());
        Ok(rule)
    }

    async fn find_availability(&self, doctor_id: Uuid, day_of_week: u8) -> StoreResult<Option<DoctorAvailability>> {
        Ok(self.tables.read().await.availability.get(&(doctor_id, day_of_week)).cloned())
    }

    async fn list_availability(&self, doctor_id: Uuid) -> StoreResult<Vec<DoctorAvailability>> {
        let tables = self.tables.read().await;
        let mut rules: Vec<DoctorAvailability> = tables.availability.values()
            .filter(|r| r.doctor_id == doctor_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.day_of_week);
        Ok(rules)
    }

    async fn set_availability_active(&self, doctor_id: Uuid, day_of_week: u8, active: bool) -> StoreResult<DoctorAvailability> {
        let mut tables = self.tables.write().await;
        let rule = tables.availability
            .get_mut(&(doctor_id, day_of_week))
            .ok_or_else(|| StoreError::NotFound("Availability not found".to_string()))?;
        rule.is_active = active;
        Ok(rule.clone())
    }

    async fn insert_holiday(&self, holiday: Holiday) -> StoreResult<Holiday> {
        let mut tables = self.tables.write().await;
        if tables.holidays.values().any(|h| h.date == holiday.date) {
            return Err(StoreError::Conflict(format!("A holiday already exists on {}", holiday.date)));
        }
        tables.holidays.insert(holiday.id, holiday.clone());
        Ok(holiday)
    }

    async fn delete_holiday(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.holidays
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("Holiday not found".to_string()))
    }

    async fn find_holiday_on(&self, date: NaiveDate) -> StoreResult<Option<Holiday>> {
        let tables = self.tables.read().await;
        Ok(tables.holidays.values().find(|h| h.date == date).cloned())
    }

    async fn list_holidays(&self) -> StoreResult<Vec<Holiday>> {
        let mut holidays: Vec<Holiday> = self.tables.read().await.holidays.values().cloned().collect();
        holidays.sort_by_key(|h| h.date);
        Ok(holidays)
    }

    async fn create_booking(&self, appointment: Appointment, payment: Payment) -> StoreResult<(Appointment, Payment)> {
        let mut tables = self.tables.write().await;
        let taken = tables.appointments.values().any(|a| {
            a.occupies(appointment.doctor_id, appointment.date, appointment.start_time)
        });
        if taken {
            debug!("Slot {} {} already held for doctor {}", appointment.date, appointment.start_time, appointment.doctor_id);
            return Err(StoreError::Conflict(SLOT_TAKEN.to_string()));
        }
        tables.appointments.insert(appointment.id, appointment.clone());
        tables.payments.insert(payment.id, payment.clone());
        Ok((appointment, payment))
    }

    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(self.tables.read().await.appointments.get(&id).cloned())
    }

    async fn list_appointments(&self, filter: AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let tables = self.tables.read().await;
        let rows = tables.appointments.values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        Ok(newest_first(rows, |a: &Appointment| (a.date, a.start_time, a.created_at)))
    }

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let mut tables = self.tables.write().await;
        let stored = tables.appointment_mut(appointment.id)?;
        *stored = appointment.clone();
        Ok(appointment)
    }

    async fn cancel_booking(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<(Appointment, Option<Payment>)> {
        let mut tables = self.tables.write().await;
        let Tables { appointments, payments, .. } = &mut *tables;

        let appointment = appointments
            .get_mut(&appointment_id)
            .ok_or_else(|| StoreError::NotFound("Appointment not found".to_string()))?;
        if appointment.status != expected {
            return Err(StoreError::Conflict(format!(
                "Appointment is {} and can no longer be cancelled",
                appointment.status
            )));
        }
        appointment.status = AppointmentStatus::Cancelled;
        appointment.updated_at = now;
        let appointment = appointment.clone();

        let payment = payments
            .values_mut()
            .find(|p| p.appointment_id == appointment_id)
            .map(|payment| {
                match payment.status {
                    PaymentStatus::Pending => payment.status = PaymentStatus::Expired,
                    PaymentStatus::Submitted => {
                        payment.status = PaymentStatus::Rejected;
                        payment.rejection_reason = Some(CANCELLED_PAYMENT_REASON.to_string());
                    }
                    _ => {}
                }
                payment.clone()
            });

        debug!("Appointment {} cancelled, payment now {:?}", appointment.id, payment.as_ref().map(|p| p.status));
        Ok((appointment, payment))
    }

    async fn find_payment(&self, id: Uuid) -> StoreResult<Option<Payment>> {
        Ok(self.tables.read().await.payments.get(&id).cloned())
    }

    async fn find_payment_for_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.values().find(|p| p.appointment_id == appointment_id).cloned())
    }

    async fn list_payments(&self, status: Option<PaymentStatus>) -> StoreResult<Vec<Payment>> {
        let tables = self.tables.read().await;
        let rows = tables.payments.values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        Ok(newest_first(rows, |p: &Payment| p.created_at))
    }

    async fn apply_payment_transition(&self, transition: PaymentTransition) -> StoreResult<(Payment, Appointment)> {
        let mut tables = self.tables.write().await;
        let PaymentTransition { payment, expected, appointment_from, appointment_to } = transition;

        let current = tables.payments
            .get(&payment.id)
            .ok_or_else(|| StoreError::NotFound("Payment record not found".to_string()))?;
        if current.status != expected {
            return Err(StoreError::Conflict(PAYMENT_PROCESSED.to_string()));
        }

        let appointment = tables.appointment_mut(payment.appointment_id)?;
        if appointment.status != appointment_from {
            return Err(StoreError::Conflict(format!(
                "Appointment is {} and can no longer change payment state",
                appointment.status
            )));
        }
        appointment.status = appointment_to;
        appointment.updated_at = Utc::now();
        let appointment = appointment.clone();

        tables.payments.insert(payment.id, payment.clone());
        Ok((payment, appointment))
    }

    async fn expire_lapsed_bookings(&self, doctor_id: Uuid, date: NaiveDate, now: DateTime<Utc>) -> StoreResult<usize> {
        let mut tables = self.tables.write().await;
        let Tables { appointments, payments, .. } = &mut *tables;

        let mut expired = 0;
        for payment in payments.values_mut().filter(|p| p.is_lapsed(now)) {
            let Some(appointment) = appointments.get_mut(&payment.appointment_id) else {
                continue;
            };
            if appointment.doctor_id != doctor_id || appointment.date != date {
                continue;
            }
            payment.status = PaymentStatus::Expired;
            if appointment.status == AppointmentStatus::PendingPayment {
                appointment.status = AppointmentStatus::Expired;
                appointment.updated_at = now;
            }
            expired += 1;
        }

        if expired > 0 {
            info!("Expired {} lapsed bookings for doctor {} on {}", expired, doctor_id, date);
        }
        Ok(expired)
    }

    async fn save_prescription(&self, mut prescription: Prescription, record: MedicalRecord) -> StoreResult<(Prescription, MedicalRecord)> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.prescriptions.get(&prescription.appointment_id) {
            prescription.id = existing.id;
            prescription.created_at = existing.created_at;
        }
        tables.prescriptions.insert(prescription.appointment_id, prescription.clone());
        tables.records.push(record.clone());
        Ok((prescription, record))
    }

    async fn find_prescription(&self, appointment_id: Uuid) -> StoreResult<Option<Prescription>> {
        Ok(self.tables.read().await.prescriptions.get(&appointment_id).cloned())
    }

    async fn find_medical_record(&self, id: Uuid) -> StoreResult<Option<MedicalRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.records.iter().find(|r| r.id == id).cloned())
    }

    async fn list_medical_records(&self, patient_id: Uuid) -> StoreResult<Vec<MedicalRecord>> {
        let tables = self.tables.read().await;
        let rows = tables.records.iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |r: &MedicalRecord| (r.visit_date, r.created_at)))
    }

    async fn add_record_attachment(&self, record_id: Uuid, url: String) -> StoreResult<MedicalRecord> {
        let mut tables = self.tables.write().await;
        let record = tables.records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| StoreError::NotFound("Medical record not found".to_string()))?;
        record.attachments.push(url);
        Ok(record.clone())
    }

    async fn clinic_settings(&self) -> StoreResult<Option<ClinicSettings>> {
        Ok(self.tables.read().await.settings.clone())
    }

    async fn save_clinic_settings(&self, mut settings: ClinicSettings) -> StoreResult<ClinicSettings> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = &tables.settings {
            settings.id = existing.id;
        }
        tables.settings = Some(settings.clone());
        Ok(settings)
    }

    async fn insert_gallery_image(&self, image: GalleryImage) -> StoreResult<GalleryImage> {
        self.tables.write().await.gallery.insert(image.id, image.clone());
        Ok(image)
    }

    async fn find_gallery_image(&self, id: Uuid) -> StoreResult<Option<GalleryImage>> {
        Ok(self.tables.read().await.gallery.get(&id).cloned())
    }

    async fn delete_gallery_image(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.gallery
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("Image not found".to_string()))
    }

    async fn list_gallery_images(&self) -> StoreResult<Vec<GalleryImage>> {
        let images = self.tables.read().await.gallery.values().cloned().collect();
        Ok(newest_first(images, |i: &GalleryImage| i.created_at))
    }
}
