use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use urlencoding::encode;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::auth::Role;
use shared_models::clinic::{ClinicSettings, GalleryImage};
use shared_models::doctor::{Doctor, DoctorAvailability, Holiday};
use shared_models::payment::{Payment, PaymentStatus};
use shared_models::record::{MedicalRecord, Prescription};
use shared_models::user::UserAccount;

use crate::store::{
    AppointmentFilter, ClinicStore, PaymentTransition, StoreError, StoreResult, CANCELLED_PAYMENT_REASON,
};
use crate::supabase::SupabaseClient;

const RETURN_ROWS: &str = "return=representation";
const UPSERT_ROWS: &str = "resolution=merge-duplicates,return=representation";

/// Store backed by Supabase PostgREST. Multi-row writes go through the SQL
/// functions in `supabase/migrations`, each of which runs in one transaction.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

#[derive(Deserialize)]
struct UserDoctorPair {
    user: UserAccount,
    doctor: Doctor,
}

#[derive(Deserialize)]
struct BookingPair {
    appointment: Appointment,
    payment: Payment,
}

#[derive(Deserialize)]
struct CancelledBooking {
    appointment: Appointment,
    payment: Option<Payment>,
}

#[derive(Deserialize)]
struct PaymentPair {
    payment: Payment,
    appointment: Appointment,
}

#[derive(Deserialize)]
struct PrescriptionPair {
    prescription: Prescription,
    record: MedicalRecord,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub fn with_client(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    async fn select<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Vec<T>> {
        Ok(self.supabase.request(Method::GET, path, None).await?)
    }

    async fn select_one<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<T>> {
        let rows: Vec<T> = self.select(path).await?;
        Ok(rows.into_iter().next())
    }

    async fn write_one<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Value,
        prefer: &str,
        missing: &str,
    ) -> StoreResult<T> {
        let rows: Vec<T> = self.supabase
            .request_with_prefer(method, path, Some(body), prefer)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(missing.to_string()))
    }

    async fn delete_where(&self, path: &str, missing: &str) -> StoreResult<()> {
        let rows: Vec<Value> = self.supabase
            .request_with_prefer(Method::DELETE, path, None, RETURN_ROWS)
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(missing.to_string()));
        }
        Ok(())
    }
}

fn appointment_query(filter: &AppointmentFilter) -> String {
    let mut path = String::from("/rest/v1/appointments?select=*");
    if let Some(id) = filter.patient_id {
        path.push_str(&format!("&patient_id=eq.{}", id));
    }
    if let Some(id) = filter.doctor_id {
        path.push_str(&format!("&doctor_id=eq.{}", id));
    }
    if let Some(date) = filter.date {
        path.push_str(&format!("&date=eq.{}", date));
    }
    if let Some(status) = filter.status {
        path.push_str(&format!("&status=eq.{}", status));
    }
    path.push_str("&order=date.desc,start_time.desc,created_at.desc");
    path
}

#[async_trait]
impl ClinicStore for SupabaseStore {
    async fn insert_user(&self, user: UserAccount) -> StoreResult<UserAccount> {
        self.write_one(Method::POST, "/rest/v1/users", serde_json::to_value(&user)?, RETURN_ROWS, "User not created").await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        self.select_one(&format!("/rest/v1/users?id=eq.{}", id)).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        self.select_one(&format!("/rest/v1/users?email=ilike.{}", encode(email))).await
    }

    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<UserAccount>> {
        let mut path = String::from("/rest/v1/users?order=created_at.desc");
        if let Some(role) = role {
            path.push_str(&format!("&role=eq.{}", role));
        }
        self.select(&path).await
    }

    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<UserAccount> {
        let path = format!("/rest/v1/users?id=eq.{}", id);
        self.write_one(Method::PATCH, &path, json!({ "is_active": active }), RETURN_ROWS, "User not found").await
    }

    async fn insert_doctor(&self, user: UserAccount, doctor: Doctor) -> StoreResult<(UserAccount, Doctor)> {
        let pair: UserDoctorPair = self.supabase.rpc("create_doctor", json!({
            "p_user": user,
            "p_doctor": doctor,
        })).await?;
        Ok((pair.user, pair.doctor))
    }

    async fn update_doctor(&self, doctor: Doctor, name: String, phone: Option<String>) -> StoreResult<(UserAccount, Doctor)> {
        let pair: UserDoctorPair = self.supabase.rpc("update_doctor", json!({
            "p_doctor": doctor,
            "p_name": name,
            "p_phone": phone,
        })).await?;
        Ok((pair.user, pair.doctor))
    }

    async fn find_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>> {
        self.select_one(&format!("/rest/v1/doctors?id=eq.{}", id)).await
    }

    async fn find_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>> {
        self.select_one(&format!("/rest/v1/doctors?user_id=eq.{}", user_id)).await
    }

    async fn list_doctors(&self) -> StoreResult<Vec<Doctor>> {
        self.select("/rest/v1/doctors?order=created_at.desc").await
    }

    async fn upsert_availability(&self, rule: DoctorAvailability) -> StoreResult<DoctorAvailability> {
        let mut body = serde_json::to_value(&rule)?;
        // on_conflict keeps the existing row id
        if let Some(fields) = body.as_object_mut() {
            fields.remove("id");
        }
        self.write_one(
            Method::POST,
            "/rest/v1/doctor_availability?on_conflict=doctor_id,day_of_week",
            body,
            UPSERT_ROWS,
            "Availability not saved",
        ).await
    }

    async fn find_availability(&self, doctor_id: Uuid, day_of_week: u8) -> StoreResult<Option<DoctorAvailability>> {
        let path = format!("/rest/v1/doctor_availability?doctor_id=eq.{}&day_of_week=eq.{}", doctor_id, day_of_week);
        self.select_one(&path).await
    }

    async fn list_availability(&self, doctor_id: Uuid) -> StoreResult<Vec<DoctorAvailability>> {
        let path = format!("/rest/v1/doctor_availability?doctor_id=eq.{}&order=day_of_week.asc", doctor_id);
        self.select(&path).await
    }

    async fn set_availability_active(&self, doctor_id: Uuid, day_of_week: u8, active: bool) -> StoreResult<DoctorAvailability> {
        let path = format!("/rest/v1/doctor_availability?doctor_id=eq.{}&day_of_week=eq.{}", doctor_id, day_of_week);
        self.write_one(Method::PATCH, &path, json!({ "is_active": active }), RETURN_ROWS, "Availability not found").await
    }

    async fn insert_holiday(&self, holiday: Holiday) -> StoreResult<Holiday> {
        self.write_one(Method::POST, "/rest/v1/holidays", serde_json::to_value(&holiday)?, RETURN_ROWS, "Holiday not created").await
    }

    async fn delete_holiday(&self, id: Uuid) -> StoreResult<()> {
        self.delete_where(&format!("/rest/v1/holidays?id=eq.{}", id), "Holiday not found").await
    }

    async fn find_holiday_on(&self, date: NaiveDate) -> StoreResult<Option<Holiday>> {
        self.select_one(&format!("/rest/v1/holidays?date=eq.{}", date)).await
    }

    async fn list_holidays(&self) -> StoreResult<Vec<Holiday>> {
        self.select("/rest/v1/holidays?order=date.asc").await
    }

    async fn create_booking(&self, appointment: Appointment, payment: Payment) -> StoreResult<(Appointment, Payment)> {
        let pair: BookingPair = self.supabase.rpc("create_booking", json!({
            "p_appointment": appointment,
            "p_payment": payment,
        })).await?;
        Ok((pair.appointment, pair.payment))
    }

    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        self.select_one(&format!("/rest/v1/appointments?id=eq.{}", id)).await
    }

    async fn list_appointments(&self, filter: AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        self.select(&appointment_query(&filter)).await
    }

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        self.write_one(Method::PATCH, &path, serde_json::to_value(&appointment)?, RETURN_ROWS, "Appointment not found").await
    }

    async fn cancel_booking(
        &self,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<(Appointment, Option<Payment>)> {
        let cancelled: CancelledBooking = self.supabase.rpc("cancel_booking", json!({
            "p_appointment_id": appointment_id,
            "p_expected": expected,
            "p_now": now,
            "p_reason": CANCELLED_PAYMENT_REASON,
        })).await?;
        Ok((cancelled.appointment, cancelled.payment))
    }

    async fn find_payment(&self, id: Uuid) -> StoreResult<Option<Payment>> {
        self.select_one(&format!("/rest/v1/payments?id=eq.{}", id)).await
    }

    async fn find_payment_for_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Payment>> {
        self.select_one(&format!("/rest/v1/payments?appointment_id=eq.{}", appointment_id)).await
    }

    async fn list_payments(&self, status: Option<PaymentStatus>) -> StoreResult<Vec<Payment>> {
        let mut path = String::from("/rest/v1/payments?order=created_at.desc");
        if let Some(status) = status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        self.select(&path).await
    }

    async fn apply_payment_transition(&self, transition: PaymentTransition) -> StoreResult<(Payment, Appointment)> {
        let pair: PaymentPair = self.supabase.rpc("apply_payment_transition", json!({
            "p_payment": transition.payment,
            "p_expected": transition.expected,
            "p_appointment_from": transition.appointment_from,
            "p_appointment_to": transition.appointment_to,
        })).await?;
        Ok((pair.payment, pair.appointment))
    }

    async fn expire_lapsed_bookings(&self, doctor_id: Uuid, date: NaiveDate, now: DateTime<Utc>) -> StoreResult<usize> {
        let expired: i64 = self.supabase.rpc("expire_lapsed_bookings", json!({
            "p_doctor_id": doctor_id,
            "p_date": date,
            "p_now": now,
        })).await?;
        debug!("Expired {} lapsed bookings for doctor {} on {}", expired, doctor_id, date);
        Ok(expired.max(0) as usize)
    }

    async fn save_prescription(&self, prescription: Prescription, record: MedicalRecord) -> StoreResult<(Prescription, MedicalRecord)> {
        let pair: PrescriptionPair = self.supabase.rpc("save_prescription", json!({
            "p_prescription": prescription,
            "p_record": record,
        })).await?;
        Ok((pair.prescription, pair.record))
    }

    async fn find_prescription(&self, appointment_id: Uuid) -> StoreResult<Option<Prescription>> {
        self.select_one(&format!("/rest/v1/prescriptions?appointment_id=eq.{}", appointment_id)).await
    }

    async fn find_medical_record(&self, id: Uuid) -> StoreResult<Option<MedicalRecord>> {
        self.select_one(&format!("/rest/v1/medical_records?id=eq.{}", id)).await
    }

    async fn list_medical_records(&self, patient_id: Uuid) -> StoreResult<Vec<MedicalRecord>> {
        let path = format!("/rest/v1/medical_records?patient_id=eq.{}&order=visit_date.desc,created_at.desc", patient_id);
        self.select(&path).await
    }

    async fn add_record_attachment(&self, record_id: Uuid, url: String) -> StoreResult<MedicalRecord> {
        Ok(self.supabase.rpc("add_record_attachment", json!({
            "p_record_id": record_id,
            "p_url": url,
        })).await?)
    }

    async fn clinic_settings(&self) -> StoreResult<Option<ClinicSettings>> {
        self.select_one("/rest/v1/clinic_settings?limit=1").await
    }

    async fn save_clinic_settings(&self, mut settings: ClinicSettings) -> StoreResult<ClinicSettings> {
        if let Some(existing) = self.clinic_settings().await? {
            settings.id = existing.id;
        }
        self.write_one(
            Method::POST,
            "/rest/v1/clinic_settings?on_conflict=id",
            serde_json::to_value(&settings)?,
            UPSERT_ROWS,
            "Settings not saved",
        ).await
    }

    async fn insert_gallery_image(&self, image: GalleryImage) -> StoreResult<GalleryImage> {
        self.write_one(Method::POST, "/rest/v1/gallery_images", serde_json::to_value(&image)?, RETURN_ROWS, "Image not saved").await
    }

    async fn find_gallery_image(&self, id: Uuid) -> StoreResult<Option<GalleryImage>> {
        self.select_one(&format!("/rest/v1/gallery_images?id=eq.{}", id)).await
    }

    async fn delete_gallery_image(&self, id: Uuid) -> StoreResult<()> {
        self.delete_where(&format!("/rest/v1/gallery_images?id=eq.{}", id), "Image not found").await
    }

    async fn list_gallery_images(&self) -> StoreResult<Vec<GalleryImage>> {
        self.select("/rest/v1/gallery_images?order=created_at.desc").await
    }
}
