use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use shared_models::auth::SessionUser;
use shared_models::error::AppError;

use crate::jwt::validate_token;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session-token";

/// Bearer token from the Authorization header, else the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty()),
    }
}

/// Decodes the session token, if any. Invalid tokens count as no session.
pub fn decode_session(headers: &HeaderMap, jwt_secret: &str) -> Option<SessionUser> {
    session_token(headers).and_then(|token| validate_token(&token, jwt_secret).ok())
}

/// Rejects requests without a valid session and stores the decoded
/// [`SessionUser`] in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers())
        .ok_or_else(|| AppError::Auth("Unauthorized".to_string()))?;

    let user = validate_token(&token, &state.config.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        AppError::Auth("Unauthorized".to_string())
    })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        headers.insert("cookie", HeaderValue::from_static("session-token=cookie-token"));
        assert_eq!(session_token(&headers).as_deref(), Some("header-token"));
    }

    #[test]
    fn falls_back_to_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark; session-token=cookie-token"));
        assert_eq!(session_token(&headers).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn no_credentials_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(session_token(&headers), None);
    }
}
