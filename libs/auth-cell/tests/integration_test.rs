use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;

use auth_cell::router::auth_routes;
use shared_utils::test_utils::{json_request, response_json, JwtTestUtils, TestClinic, TestUser};

fn create_test_app(clinic: &TestClinic) -> Router {
    auth_routes(clinic.state.clone())
}

fn register_body(email: &str) -> serde_json::Value {
    json!({
        "name": "Asha Rao",
        "email": email,
        "phone": "9876543210",
        "password": "secret123"
    })
}

#[tokio::test]
async fn test_register_creates_patient_and_sets_cookie() {
    let clinic = TestClinic::new();
    let app = create_test_app(&clinic);

    let response = app
        .oneshot(json_request("POST", "/register", None, Some(register_body("asha@example.com"))))
        .await
        .unwrap();

    let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(cookie.starts_with("session-token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=604800"));

    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "PATIENT");
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].as_str().unwrap().split('.').count() == 3);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let clinic = TestClinic::new();
    clinic.seed_patient("taken@example.com").await;

    let response = create_test_app(&clinic)
        .oneshot(json_request("POST", "/register", None, Some(register_body("taken@example.com"))))
        .await
        .unwrap();

    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn test_register_validates_fields() {
    let clinic = TestClinic::new();
    let app = create_test_app(&clinic);

    let cases = [
        json!({ "name": "A", "email": "a@example.com", "password": "secret123" }),
        json!({ "name": "Asha", "email": "nope", "password": "secret123" }),
        json!({ "name": "Asha", "email": "a@example.com", "phone": "12345", "password": "secret123" }),
        json!({ "name": "Asha", "email": "a@example.com", "password": "123" }),
    ];

    for body in cases {
        let response = app.clone().oneshot(json_request("POST", "/register", None, Some(body))).await.unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }
}

#[tokio::test]
async fn test_login_round_trip_and_me() {
    let clinic = TestClinic::new();
    let app = create_test_app(&clinic);

    app.clone()
        .oneshot(json_request("POST", "/register", None, Some(register_body("login@example.com"))))
        .await
        .unwrap();

    let response = app.clone()
        .oneshot(json_request("POST", "/login", None, Some(json!({
            "email": "login@example.com",
            "password": "secret123"
        }))))
        .await
        .unwrap();
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let response = app
        .oneshot(json_request("GET", "/me", Some(&token), None))
        .await
        .unwrap();
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "login@example.com");
}

#[tokio::test]
async fn test_me_accepts_session_cookie() {
    let clinic = TestClinic::new();
    let patient = clinic.seed_patient("cookie@example.com").await;
    let token = clinic.token_for(&patient);

    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .header(header::COOKIE, format!("session-token={}", token))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(&clinic).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_wrong_password_is_generic() {
    let clinic = TestClinic::new();
    clinic.seed_patient("who@example.com").await;
    let app = create_test_app(&clinic);

    for (email, password) in [("who@example.com", "wrong-pass"), ("nobody@example.com", "secret123")] {
        let response = app.clone()
            .oneshot(json_request("POST", "/login", None, Some(json!({ "email": email, "password": password }))))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid email or password");
    }
}

#[tokio::test]
async fn test_login_disabled_account_is_forbidden() {
    let clinic = TestClinic::new();
    let patient = clinic.seed_patient("off@example.com").await;
    clinic.store().set_user_active(patient.id, false).await.unwrap();

    let response = create_test_app(&clinic)
        .oneshot(json_request("POST", "/login", None, Some(json!({
            "email": "off@example.com",
            "password": "secret123"
        }))))
        .await
        .unwrap();

    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Account has been disabled");
}

#[tokio::test]
async fn test_me_rejects_banned_user_with_live_token() {
    let clinic = TestClinic::new();
    let patient = clinic.seed_patient("ban@example.com").await;
    let token = clinic.token_for(&patient);
    clinic.store().set_user_active(patient.id, false).await.unwrap();

    let response = create_test_app(&clinic)
        .oneshot(json_request("GET", "/me", Some(&token), None))
        .await
        .unwrap();

    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Account disabled");
}

#[tokio::test]
async fn test_validate_token_endpoint() {
    let clinic = TestClinic::new();
    let patient = clinic.seed_patient("valid@example.com").await;
    let token = clinic.token_for(&patient);

    let response = create_test_app(&clinic)
        .oneshot(json_request("POST", "/validate", Some(&token), None))
        .await
        .unwrap();

    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["user_id"], patient.id.to_string());
    assert_eq!(body["role"], "PATIENT");
}

#[tokio::test]
async fn test_validate_token_endpoint_unauthorized() {
    let clinic = TestClinic::new();

    let response = create_test_app(&clinic)
        .oneshot(json_request("POST", "/validate", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_token_endpoint_invalid_tokens() {
    let clinic = TestClinic::new();
    let user = TestUser::patient("ghost@example.com");
    let secret = clinic.state.config.jwt_secret.clone();

    for token in [
        JwtTestUtils::create_expired_token(&user, &secret),
        JwtTestUtils::create_invalid_signature_token(&user),
        JwtTestUtils::create_malformed_token(),
    ] {
        let response = create_test_app(&clinic)
            .oneshot(json_request("POST", "/verify", Some(&token), None))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], false);
    }
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let clinic = TestClinic::new();

    let request = Request::builder()
        .method("POST")
        .uri("/logout")
        .header(header::COOKIE, "session-token=abc")
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(&clinic).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("session-token="));
    assert!(cookie.contains("Max-Age=0"));
}
