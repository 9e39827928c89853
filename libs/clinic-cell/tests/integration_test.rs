use std::sync::Arc;

use axum::{http::StatusCode, Router};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinic_cell::models::{ClinicError, CreateHolidayRequest};
use clinic_cell::router::clinic_routes;
use clinic_cell::services::HolidayService;
use shared_database::{ClinicStore, InMemoryStore, PaymentTransition, SupabaseMediaStorage};
use shared_models::appointment::AppointmentStatus;
use shared_models::auth::Role;
use shared_models::payment::PaymentStatus;
use shared_models::user::UserAccount;
use shared_utils::jwt::issue_token;
use shared_utils::test_utils::{json_request, response_json, TestClinic, TestConfig};
use shared_utils::AppState;

const PNG: &str = "data:image/png;base64,aGVsbG8=";

fn create_test_app(clinic: &TestClinic) -> Router {
    clinic_routes(clinic.state.clone())
}

#[tokio::test]
async fn test_holiday_requires_date_and_rejects_duplicates() {
    let clinic = TestClinic::new();
    let admin = clinic.seed_admin().await;
    let app = create_test_app(&clinic);
    let token = clinic.token_for(&admin);

    let (status, body) = response_json(
        app.clone()
            .oneshot(json_request("POST", "/holidays", Some(&token), Some(json!({ "reason": "Diwali" }))))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Date is required");

    let holiday = json!({ "date": "2030-01-07", "reason": "Diwali" });
    let (status, body) = response_json(
        app.clone()
            .oneshot(json_request("POST", "/holidays", Some(&token), Some(holiday.clone())))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["holiday"]["reason"], "Diwali");

    let (status, _) = response_json(
        app.oneshot(json_request("POST", "/holidays", Some(&token), Some(holiday)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_concurrent_holidays_on_one_date_single_winner() {
    let clinic = TestClinic::new();
    let service = HolidayService::new(&clinic.state);
    let request = || CreateHolidayRequest {
        date: Some("2030-01-26".to_string()),
        reason: Some("Republic Day".to_string()),
    };

    let (first, second) = tokio::join!(service.add_holiday(request()), service.add_holiday(request()));
    let conflicts = [&first, &second]
        .iter()
        .filter(|result| matches!(result, Err(ClinicError::HolidayExists(_))))
        .count();
    assert_eq!(conflicts, 1);
    assert!(first.is_ok() || second.is_ok());
    assert_eq!(clinic.store().list_holidays().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_holidays_are_public_and_sorted() {
    let clinic = TestClinic::new();
    clinic.seed_holiday(NaiveDate::from_ymd_opt(2030, 3, 1).unwrap(), None).await;
    clinic.seed_holiday(NaiveDate::from_ymd_opt(2030, 1, 26).unwrap(), Some("Republic Day")).await;

    let (status, body) = response_json(
        create_test_app(&clinic)
            .oneshot(json_request("GET", "/holidays", None, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body["holidays"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2030-01-26", "2030-03-01"]);
}

#[tokio::test]
async fn test_remove_holiday() {
    let clinic = TestClinic::new();
    let admin = clinic.seed_admin().await;
    let holiday = clinic.seed_holiday(NaiveDate::from_ymd_opt(2030, 1, 26).unwrap(), None).await;
    let app = create_test_app(&clinic);
    let token = clinic.token_for(&admin);
    let uri = format!("/holidays/{}", holiday.id);

    let (status, _) = response_json(app.clone().oneshot(json_request("DELETE", &uri, Some(&token), None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(clinic.store().list_holidays().await.unwrap().is_empty());

    let (status, _) = response_json(app.oneshot(json_request("DELETE", &uri, Some(&token), None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patient_cannot_manage_holidays() {
    let clinic = TestClinic::new();
    let patient = clinic.seed_patient("asha@example.com").await;

    let (status, _) = response_json(
        create_test_app(&clinic)
            .oneshot(json_request(
                "POST",
                "/holidays",
                Some(&clinic.token_for(&patient)),
                Some(json!({ "date": "2030-01-07" })),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_settings_default_then_update() {
    let clinic = TestClinic::new();
    let admin = clinic.seed_admin().await;
    let app = create_test_app(&clinic);
    let token = clinic.token_for(&admin);

    let (status, body) = response_json(app.clone().oneshot(json_request("GET", "/settings", None, None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["settings"]["clinic_name"].as_str().unwrap().is_empty());
    assert!(body["settings"]["upi_id"].is_null());

    let (status, _) = response_json(
        app.clone()
            .oneshot(json_request(
                "PUT",
                "/settings",
                Some(&token),
                Some(json!({ "clinic_name": "Sunrise Clinic", "email": "not-an-email" })),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = response_json(
        app.clone()
            .oneshot(json_request(
                "PUT",
                "/settings",
                Some(&token),
                Some(json!({ "clinic_name": "Sunrise Clinic", "upi_id": "sunrise@upi", "email": "" })),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["settings"]["clinic_name"], "Sunrise Clinic");
    assert!(body["settings"]["email"].is_null());

    let (_, body) = response_json(app.oneshot(json_request("GET", "/settings", None, None)).await.unwrap()).await;
    assert_eq!(body["settings"]["upi_id"], "sunrise@upi");
}

#[tokio::test]
async fn test_upload_qr_code_sets_url() {
    let clinic = TestClinic::new();
    let admin = clinic.seed_admin().await;

    let (status, body) = response_json(
        create_test_app(&clinic)
            .oneshot(json_request(
                "POST",
                "/settings/images",
                Some(&clinic.token_for(&admin)),
                Some(json!({ "kind": "qr_code", "file": PNG })),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["settings"]["qr_code_url"].as_str().unwrap();
    assert!(url.starts_with("memory://clinic/qrCode/"));
    assert!(body["settings"]["logo"].is_null());
}

#[tokio::test]
async fn test_gallery_add_list_remove() {
    let clinic = TestClinic::new();
    let admin = clinic.seed_admin().await;
    let app = create_test_app(&clinic);
    let token = clinic.token_for(&admin);

    let (status, body) = response_json(
        app.clone()
            .oneshot(json_request(
                "POST",
                "/gallery",
                Some(&token),
                Some(json!({ "file": PNG, "caption": "Reception" })),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let image_id = body["image"]["id"].as_str().unwrap().to_string();
    let public_id = body["image"]["public_id"].as_str().unwrap().to_string();
    assert!(clinic.media.contains(&public_id).await);

    let (_, body) = response_json(app.clone().oneshot(json_request("GET", "/gallery", None, None)).await.unwrap()).await;
    assert_eq!(body["images"].as_array().unwrap().len(), 1);
    assert_eq!(body["images"][0]["caption"], "Reception");

    let uri = format!("/gallery/{}", image_id);
    let (status, _) = response_json(app.clone().oneshot(json_request("DELETE", &uri, Some(&token), None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!clinic.media.contains(&public_id).await);

    let (status, body) = response_json(app.oneshot(json_request("DELETE", &uri, Some(&token), None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Image not found");
}

#[tokio::test]
async fn test_gallery_row_survives_storage_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/clinic/clinic/gallery/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "clinic/gallery/x.png" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/storage/v1/object/clinic/clinic/gallery/.+$"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = server.uri();
    config.supabase_service_key = "service-role-key".to_string();
    let media = Arc::new(SupabaseMediaStorage::new(&config));
    let state = AppState::new(config, Arc::new(InMemoryStore::new()), media);

    let admin = state
        .store
        .insert_user(UserAccount::new("Admin", "admin@clinic.com", None, "unused-hash".to_string(), Role::Admin))
        .await
        .unwrap();
    let token = issue_token(&admin.session(), &state.config.jwt_secret, Duration::days(1)).unwrap();
    let app = clinic_routes(state.clone());

    let (status, body) = response_json(
        app.clone()
            .oneshot(json_request("POST", "/gallery", Some(&token), Some(json!({ "file": PNG }))))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["image"]["url"].as_str().unwrap().starts_with(&server.uri()));
    let uri = format!("/gallery/{}", body["image"]["id"].as_str().unwrap());

    let (status, _) = response_json(app.oneshot(json_request("DELETE", &uri, Some(&token), None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(state.store.list_gallery_images().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_seed_runs_once() {
    let clinic = TestClinic::new();
    let app = create_test_app(&clinic);

    let (status, body) = response_json(app.clone().oneshot(json_request("POST", "/seed", None, None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["admin"]["email"], "admin@clinic.com");
    assert_eq!(body["admin"]["role"], "ADMIN");
    assert!(clinic.store().clinic_settings().await.unwrap().is_some());

    let (status, body) = response_json(app.oneshot(json_request("POST", "/seed", None, None)).await.unwrap()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Admin already exists");
    assert_eq!(clinic.store().list_users(Some(Role::Admin)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let clinic = TestClinic::new();
    let admin = clinic.seed_admin().await;
    let patient = clinic.seed_patient("asha@example.com").await;
    clinic.seed_patient("ravi@example.com").await;
    let (_, doctor) = clinic.seed_doctor("Dr. Mehta", "mehta@clinic.com", 500.0).await;

    let today = Utc::now().date_naive();
    let later = Utc::now() + Duration::minutes(15);
    let (_, submitted) = clinic.seed_booking(patient.id, doctor.id, today, "09:00", 30, later).await;
    let (_, verified) = clinic.seed_booking(patient.id, doctor.id, today, "09:30", 30, later).await;
    clinic.seed_booking(patient.id, doctor.id, today + Duration::days(1), "09:00", 30, later).await;

    for payment in [&submitted, &verified] {
        let mut next = payment.clone();
        next.status = PaymentStatus::Submitted;
        next.utr_number = Some("UTR123456".to_string());
        clinic
            .store()
            .apply_payment_transition(PaymentTransition {
                payment: next,
                expected: PaymentStatus::Pending,
                appointment_from: AppointmentStatus::PendingPayment,
                appointment_to: AppointmentStatus::PaymentSubmitted,
            })
            .await
            .unwrap();
    }
    let mut confirmed = verified.clone();
    confirmed.status = PaymentStatus::Verified;
    confirmed.utr_number = Some("UTR123456".to_string());
    confirmed.verified_by = Some(admin.id);
    confirmed.verified_at = Some(Utc::now());
    clinic
        .store()
        .apply_payment_transition(PaymentTransition {
            payment: confirmed,
            expected: PaymentStatus::Submitted,
            appointment_from: AppointmentStatus::PaymentSubmitted,
            appointment_to: AppointmentStatus::Confirmed,
        })
        .await
        .unwrap();

    let (status, body) = response_json(
        create_test_app(&clinic)
            .oneshot(json_request("GET", "/dashboard", Some(&clinic.token_for(&admin)), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patients"], 2);
    assert_eq!(body["doctors"], 1);
    assert_eq!(body["appointments"], 3);
    assert_eq!(body["today_appointments"], 2);
    assert_eq!(body["pending_payments"], 1);
    assert_eq!(body["today_revenue"], 500.0);
    assert_eq!(body["total_revenue"], 500.0);
}

#[tokio::test]
async fn test_dashboard_requires_admin() {
    let clinic = TestClinic::new();
    let (doctor_user, _) = clinic.seed_doctor("Dr. Mehta", "mehta@clinic.com", 500.0).await;

    let (status, _) = response_json(
        create_test_app(&clinic)
            .oneshot(json_request("GET", "/dashboard", Some(&clinic.token_for(&doctor_user)), None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = response_json(
        create_test_app(&clinic)
            .oneshot(json_request("GET", "/dashboard", None, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
