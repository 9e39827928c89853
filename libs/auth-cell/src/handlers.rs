use axum::{
    extract::{Extension, Json, State},
    http::HeaderMap,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::{SessionUser, TokenResponse};
use shared_models::error::AppError;
use shared_utils::extractor::{session_token, SESSION_COOKIE};
use shared_utils::jwt::validate_token;
use shared_utils::{AppState, SessionGate};

use crate::models::{AuthResponse, LoginRequest, RegisterRequest};
use crate::services::AccountService;

fn session_cookie(state: &AppState, token: &str) -> Result<Cookie<'static>, AppError> {
    let max_age = state.session_ttl().num_seconds();
    let secure = if state.config.cookie_secure { "; Secure" } else { "" };
    Cookie::parse(format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE, token, max_age, secure
    ))
    .map_err(|e| AppError::Internal(format!("Failed to build session cookie: {}", e)))
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let service = AccountService::new(&state);
    let (user, token) = service.register(request).await?;

    let jar = jar.add(session_cookie(&state, &token)?);
    Ok((jar, Json(AuthResponse { user: user.profile(), token })))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let service = AccountService::new(&state);
    let (user, token) = service.login(request).await?;

    let jar = jar.add(session_cookie(&state, &token)?);
    Ok((jar, Json(AuthResponse { user: user.profile(), token })))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(json!({ "success": true })))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<Value>, AppError> {
    let account = SessionGate::new(&state).require(&user, &[]).await?;
    debug!("Returning profile for user: {}", account.id);
    Ok(Json(json!(account.profile())))
}

pub async fn validate_token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = session_token(&headers)
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;
    let user = validate_token(&token, &state.config.jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;
    let account = SessionGate::new(&state).require(&user, &[]).await?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: account.id,
        email: account.email,
        role: account.role,
    }))
}

pub async fn verify_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<Value> {
    debug!("Verifying token");

    let valid = match session_token(&headers) {
        Some(token) => match validate_token(&token, &state.config.jwt_secret) {
            Ok(user) => SessionGate::new(&state).require(&user, &[]).await.is_ok(),
            Err(_) => false,
        },
        None => false,
    };

    Json(json!({ "valid": valid }))
}
