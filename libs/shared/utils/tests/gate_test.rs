use assert_matches::assert_matches;

use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{JwtTestUtils, TestClinic, TestConfig, TestUser};
use shared_utils::SessionGate;

#[tokio::test]
async fn missing_session_is_unauthorized() {
    let clinic = TestClinic::new();
    let gate = SessionGate::new(&clinic.state);

    let err = gate.authorize(None, &[Role::Admin]).await.unwrap_err();
    assert_matches!(err, AppError::Auth(msg) if msg == "Unauthorized");
}

#[tokio::test]
async fn role_is_checked_before_account_state() {
    let clinic = TestClinic::new();
    let patient = clinic.seed_patient("p@example.com").await;
    clinic.store().set_user_active(patient.id, false).await.unwrap();

    let gate = SessionGate::new(&clinic.state);
    let err = gate.require(&patient.session(), &[Role::Admin]).await.unwrap_err();
    assert_matches!(err, AppError::Forbidden(msg) if msg == "Forbidden");
}

#[tokio::test]
async fn banned_user_with_valid_token_is_rejected() {
    let clinic = TestClinic::new();
    let patient = clinic.seed_patient("banned@example.com").await;
    let token = clinic.token_for(&patient);

    let session = validate_token(&token, &clinic.state.config.jwt_secret).unwrap();
    let gate = SessionGate::new(&clinic.state);
    assert!(gate.require(&session, &[Role::Patient]).await.is_ok());

    clinic.store().set_user_active(patient.id, false).await.unwrap();

    // the token itself is still valid
    let session = validate_token(&token, &clinic.state.config.jwt_secret).unwrap();
    let err = gate.require(&session, &[Role::Patient]).await.unwrap_err();
    assert_matches!(err, AppError::Auth(msg) if msg == "Account disabled");
}

#[tokio::test]
async fn unknown_account_is_treated_as_disabled() {
    let clinic = TestClinic::new();
    let ghost = TestUser::admin("ghost@example.com");

    let gate = SessionGate::new(&clinic.state);
    let err = gate.require(&ghost.to_session(), &[]).await.unwrap_err();
    assert_matches!(err, AppError::Auth(msg) if msg == "Account disabled");
}

#[test]
fn hand_built_tokens_validate_like_issued_ones() {
    let config = TestConfig::default();
    let user = TestUser::doctor("doc@example.com");

    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    assert_eq!(validate_token(&token, &config.jwt_secret).unwrap().id, user.id);

    assert!(validate_token(&JwtTestUtils::create_expired_token(&user, &config.jwt_secret), &config.jwt_secret).is_err());
    assert!(validate_token(&JwtTestUtils::create_invalid_signature_token(&user), &config.jwt_secret).is_err());
    assert!(validate_token(&JwtTestUtils::create_malformed_token(), &config.jwt_secret).is_err());
}
