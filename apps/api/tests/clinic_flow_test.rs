use axum::{http::StatusCode, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use clinic_api::router::create_router;
use shared_utils::test_utils::{json_request, response_json, TestClinic, TestConfig};

// 2030-01-07 is a Monday.
const MONDAY: &str = "2030-01-07";

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    response_json(app.clone().oneshot(json_request(method, uri, token, body)).await.unwrap()).await
}

struct Clinic {
    app: Router,
    admin: String,
    doctor: String,
    doctor_id: String,
    patient: String,
}

/// Seeds the admin, onboards one doctor working Monday mornings and registers a patient.
async fn open_clinic(clinic: &TestClinic) -> Clinic {
    let app = create_router(clinic.state.clone());

    let (status, _) = call(&app, "POST", "/clinic/seed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "admin@clinic.com", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admin = body["token"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        "/doctors",
        Some(&admin),
        Some(json!({
            "name": "Dr. Mehta",
            "email": "mehta@clinic.com",
            "password": "doctor123",
            "specialization": "General Medicine",
            "qualification": "MBBS",
            "experience_years": 8,
            "consultation_fee": 400.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let doctor_id = body["doctor"]["id"].as_str().unwrap().to_string();

    let (_, body) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "mehta@clinic.com", "password": "doctor123" })),
    )
    .await;
    let doctor = body["token"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        "PUT",
        &format!("/doctors/{}/availability", doctor_id),
        Some(&doctor),
        Some(json!({ "day_of_week": 1, "start_time": "09:00", "end_time": "12:00", "slot_duration": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Asha Rao", "email": "asha@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let patient = body["token"].as_str().unwrap().to_string();

    Clinic { app, admin, doctor, doctor_id, patient }
}

async fn book(c: &Clinic, start: &str, end: &str) -> (StatusCode, Value) {
    call(
        &c.app,
        "POST",
        "/appointments",
        Some(&c.patient),
        Some(json!({ "doctor_id": c.doctor_id, "date": MONDAY, "start_time": start, "end_time": end })),
    )
    .await
}

fn slot_available(schedule: &Value, start: &str) -> bool {
    schedule["slots"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["start_time"] == start)
        .map(|s| s["available"].as_bool().unwrap())
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let clinic = TestClinic::new();
    let app = create_router(clinic.state.clone());

    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_visit_from_booking_to_prescription() {
    let clinic = TestClinic::new();
    let c = open_clinic(&clinic).await;
    let slots_uri = format!("/doctors/{}/slots?date={}", c.doctor_id, MONDAY);

    let (status, schedule) = call(&c.app, "GET", &slots_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(schedule["slots"].as_array().unwrap().len(), 6);
    assert!(slot_available(&schedule, "09:30"));

    let (status, booking) = book(&c, "09:30", "10:00").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["appointment"]["status"], "PENDING_PAYMENT");
    assert_eq!(booking["payment"]["status"], "PENDING");
    assert_eq!(booking["payment"]["amount"], 400.0);
    let appointment_id = booking["appointment"]["id"].as_str().unwrap().to_string();
    let payment_id = booking["payment"]["id"].as_str().unwrap().to_string();

    let (_, schedule) = call(&c.app, "GET", &slots_uri, None, None).await;
    assert!(!slot_available(&schedule, "09:30"));
    assert!(slot_available(&schedule, "10:00"));

    let (status, body) = book(&c, "09:30", "10:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "This slot is no longer available");

    let (status, body) = call(
        &c.app,
        "POST",
        "/payments/submit",
        Some(&c.patient),
        Some(json!({ "appointmentId": appointment_id, "utrNumber": "UTR4455667788" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment"]["status"], "SUBMITTED");
    assert_eq!(body["appointment"]["status"], "PAYMENT_SUBMITTED");

    let (status, body) = call(
        &c.app,
        "POST",
        "/payments/verify",
        Some(&c.admin),
        Some(json!({ "paymentId": payment_id, "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["payment"]["status"], "VERIFIED");
    assert_eq!(body["appointment"]["status"], "CONFIRMED");

    let (status, body) = call(
        &c.app,
        "POST",
        "/appointments/assign-token",
        Some(&c.admin),
        Some(json!({ "appointmentId": appointment_id, "tokenNumber": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["token_number"], 1);
    assert_eq!(body["appointment"]["token_status"], "ASSIGNED");

    let (status, body) = call(
        &c.app,
        "PUT",
        &format!("/appointments/{}/status", appointment_id),
        Some(&c.doctor),
        Some(json!({ "status": "COMPLETED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "COMPLETED");

    let (status, body) = call(
        &c.app,
        "POST",
        "/records/prescriptions",
        Some(&c.doctor),
        Some(json!({
            "appointment_id": appointment_id,
            "diagnosis": "Seasonal flu",
            "medications": [
                { "name": "Paracetamol", "dosage": "500mg", "frequency": "TID", "duration": "3 days" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prescription"]["diagnosis"], "Seasonal flu");

    let (status, body) = call(&c.app, "GET", "/records", Some(&c.patient), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"].as_array().unwrap().len(), 1);

    let (status, body) = call(&c.app, "GET", "/clinic/dashboard", Some(&c.admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patients"], 1);
    assert_eq!(body["doctors"], 1);
    assert_eq!(body["total_revenue"], 400.0);
}

#[tokio::test]
async fn test_rejected_payment_frees_the_slot() {
    let clinic = TestClinic::new();
    let c = open_clinic(&clinic).await;

    let (_, booking) = book(&c, "10:00", "10:30").await;
    let appointment_id = booking["appointment"]["id"].as_str().unwrap().to_string();
    let payment_id = booking["payment"]["id"].as_str().unwrap().to_string();

    call(
        &c.app,
        "POST",
        "/payments/submit",
        Some(&c.patient),
        Some(json!({ "appointment_id": appointment_id, "utr_number": "UTR0000001" })),
    )
    .await;

    let (status, body) = call(
        &c.app,
        "POST",
        "/payments/verify",
        Some(&c.admin),
        Some(json!({ "paymentId": payment_id, "action": "reject" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let (status, body) = call(
        &c.app,
        "POST",
        "/payments/verify",
        Some(&c.admin),
        Some(json!({ "paymentId": payment_id, "action": "reject", "reason": "UTR not found in statement" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment"]["status"], "REJECTED");
    assert_eq!(body["payment"]["rejection_reason"], "UTR not found in statement");
    assert_eq!(body["appointment"]["status"], "CANCELLED");

    let (status, body) = call(
        &c.app,
        "POST",
        "/payments/verify",
        Some(&c.admin),
        Some(json!({ "paymentId": payment_id, "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().is_some());

    let (status, _) = book(&c, "10:00", "10:30").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cancel_after_submit_withdraws_payment() {
    let clinic = TestClinic::new();
    let c = open_clinic(&clinic).await;

    let (_, booking) = book(&c, "09:30", "10:00").await;
    let appointment_id = booking["appointment"]["id"].as_str().unwrap().to_string();
    let payment_id = booking["payment"]["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &c.app,
        "POST",
        "/payments/submit",
        Some(&c.patient),
        Some(json!({ "appointment_id": appointment_id, "utr_number": "UTR5544332211" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/appointments/{}/cancel", appointment_id);
    let (status, body) = call(&c.app, "POST", &uri, Some(&c.patient), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "CANCELLED");

    let (status, body) = call(
        &c.app,
        "POST",
        "/payments/verify",
        Some(&c.admin),
        Some(json!({ "paymentId": payment_id, "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Payment is not awaiting verification");

    let (_, body) = call(&c.app, "GET", "/clinic/dashboard", Some(&c.admin), None).await;
    assert_eq!(body["pending_payments"], 0);
    assert_eq!(body["total_revenue"], 0.0);

    let (_, schedule) = call(
        &c.app,
        "GET",
        &format!("/doctors/{}/slots?date={}", c.doctor_id, MONDAY),
        None,
        None,
    )
    .await;
    assert!(slot_available(&schedule, "09:30"));
}

#[tokio::test]
async fn test_lapsed_window_expires_booking() {
    let clinic = TestClinic::with_config(TestConfig {
        payment_window_minutes: 0,
        ..TestConfig::default()
    });
    let c = open_clinic(&clinic).await;

    let (_, booking) = book(&c, "11:00", "11:30").await;
    let appointment_id = booking["appointment"]["id"].as_str().unwrap().to_string();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let submit = json!({ "appointmentId": appointment_id, "utrNumber": "UTR9988776655" });
    for _ in 0..2 {
        let (status, body) = call(&c.app, "POST", "/payments/submit", Some(&c.patient), Some(submit.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Payment window expired. Please book again.");
    }

    let (_, body) = call(&c.app, "GET", &format!("/appointments/{}", appointment_id), Some(&c.patient), None).await;
    assert_eq!(body["appointment"]["status"], "EXPIRED");

    let (_, schedule) = call(
        &c.app,
        "GET",
        &format!("/doctors/{}/slots?date={}", c.doctor_id, MONDAY),
        None,
        None,
    )
    .await;
    assert!(slot_available(&schedule, "11:00"));
}

#[tokio::test]
async fn test_banned_patient_loses_access_with_live_token() {
    let clinic = TestClinic::new();
    let c = open_clinic(&clinic).await;

    let (status, _) = call(&c.app, "GET", "/auth/me", Some(&c.patient), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&c.app, "GET", "/patients", Some(&c.admin), None).await;
    let patient_id = body["patients"][0]["id"].as_str().unwrap().to_string();
    let (status, _) = call(
        &c.app,
        "POST",
        &format!("/patients/users/{}/toggle-status", patient_id),
        Some(&c.admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = book(&c, "09:00", "09:30").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Account disabled");
}

#[tokio::test]
async fn test_holiday_closes_bookings() {
    let clinic = TestClinic::new();
    let c = open_clinic(&clinic).await;

    let (status, _) = call(
        &c.app,
        "POST",
        "/clinic/holidays",
        Some(&c.admin),
        Some(json!({ "date": MONDAY, "reason": "Pongal" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, schedule) = call(
        &c.app,
        "GET",
        &format!("/doctors/{}/slots?date={}", c.doctor_id, MONDAY),
        None,
        None,
    )
    .await;
    assert_eq!(schedule["slots"], json!([]));
    assert_eq!(schedule["message"], "Holiday: Pongal");

    let (status, body) = book(&c, "09:00", "09:30").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Holiday: Pongal");
}
