use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};
use shared_database::{ClinicStore, InMemoryMediaStorage, InMemoryStore};
use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::auth::{Role, SessionUser};
use shared_models::doctor::{Doctor, DoctorAvailability, Holiday};
use shared_models::payment::{Payment, PaymentStatus};
use shared_models::user::UserAccount;

use crate::jwt::issue_token;
use crate::password::PasswordService;
use crate::state::AppState;

pub const TEST_PASSWORD: &str = "secret123";

pub struct TestConfig {
    pub jwt_secret: String,
    pub payment_window_minutes: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            payment_window_minutes: 15,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            storage_bucket: "clinic".to_string(),
            jwt_secret: self.jwt_secret.clone(),
            session_ttl_days: 7,
            payment_window_minutes: self.payment_window_minutes,
            store_backend: StoreBackend::Memory,
            port: 0,
            seed_admin_email: "admin@clinic.com".to_string(),
            seed_admin_password: "admin123".to_string(),
            cookie_secure: false,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(name: &str, email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role,
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new("Test Patient", email, Role::Patient)
    }

    pub fn doctor(email: &str) -> Self {
        Self::new("Dr. Test", email, Role::Doctor)
    }

    pub fn admin(email: &str) -> Self {
        Self::new("Clinic Admin", email, Role::Admin)
    }

    pub fn to_session(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Hand-built tokens, independent of [`issue_token`], for negative cases.
pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// In-memory clinic with seeding helpers.
pub struct TestClinic {
    pub state: AppState,
    pub media: Arc<InMemoryMediaStorage>,
}

impl Default for TestClinic {
    fn default() -> Self {
        Self::with_config(TestConfig::default())
    }
}

impl TestClinic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TestConfig) -> Self {
        let media = Arc::new(InMemoryMediaStorage::new());
        let state = AppState::new(config.to_app_config(), Arc::new(InMemoryStore::new()), media.clone());
        Self { state, media }
    }

    pub fn store(&self) -> &Arc<dyn ClinicStore> {
        &self.state.store
    }

    pub async fn seed_user(&self, role: Role, name: &str, email: &str) -> UserAccount {
        let hash = PasswordService::hash_password(TEST_PASSWORD).unwrap();
        let user = UserAccount::new(name, email, None, hash, role);
        self.state.store.insert_user(user).await.unwrap()
    }

    pub async fn seed_patient(&self, email: &str) -> UserAccount {
        self.seed_user(Role::Patient, "Test Patient", email).await
    }

    pub async fn seed_admin(&self) -> UserAccount {
        self.seed_user(Role::Admin, "Clinic Admin", "admin@clinic.com").await
    }

    pub async fn seed_doctor(&self, name: &str, email: &str, fee: f64) -> (UserAccount, Doctor) {
        let hash = PasswordService::hash_password(TEST_PASSWORD).unwrap();
        let user = UserAccount::new(name, email, None, hash, Role::Doctor);
        let doctor = Doctor {
            id: Uuid::new_v4(),
            user_id: user.id,
            specialization: "General Dentistry".to_string(),
            qualification: "BDS".to_string(),
            experience_years: 8,
            consultation_fee: fee,
            bio: None,
            created_at: Utc::now(),
        };
        self.state.store.insert_doctor(user, doctor).await.unwrap()
    }

    pub async fn seed_weekly_rule(&self, doctor_id: Uuid, day_of_week: u8, start: &str, end: &str, slot_duration: u16) -> DoctorAvailability {
        let rule = DoctorAvailability {
            id: Uuid::new_v4(),
            doctor_id,
            day_of_week,
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            slot_duration,
            is_active: true,
        };
        self.state.store.upsert_availability(rule).await.unwrap()
    }

    /// Books `start` for `slot_minutes` with a pending payment due at `expires_at`.
    pub async fn seed_booking(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        date: NaiveDate,
        start: &str,
        slot_minutes: u16,
        expires_at: DateTime<Utc>,
    ) -> (Appointment, Payment) {
        let start: shared_models::schedule::TimeOfDay = start.parse().unwrap();
        let end = shared_models::schedule::TimeOfDay::from_minutes(start.minutes() + slot_minutes).unwrap();
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            date,
            start_time: start,
            end_time: end,
            status: AppointmentStatus::PendingPayment,
            token_number: None,
            token_status: None,
            created_at: now,
            updated_at: now,
        };
        let payment = Payment {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            user_id: patient_id,
            amount: 500.0,
            status: PaymentStatus::Pending,
            utr_number: None,
            screenshot_url: None,
            expires_at,
            verified_by: None,
            verified_at: None,
            rejection_reason: None,
            created_at: now,
        };
        self.state.store.create_booking(appointment, payment).await.unwrap()
    }

    /// Forces an appointment into `status`, bypassing the lifecycle.
    pub async fn force_status(&self, appointment: &Appointment, status: AppointmentStatus) -> Appointment {
        let mut appointment = appointment.clone();
        appointment.status = status;
        self.state.store.update_appointment(appointment).await.unwrap()
    }

    pub async fn seed_holiday(&self, date: NaiveDate, reason: Option<&str>) -> Holiday {
        let holiday = Holiday {
            id: Uuid::new_v4(),
            date,
            reason: reason.map(str::to_string),
        };
        self.state.store.insert_holiday(holiday).await.unwrap()
    }

    pub fn token_for(&self, user: &UserAccount) -> String {
        issue_token(&user.session(), &self.state.config.jwt_secret, Duration::days(7)).unwrap()
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn response_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
