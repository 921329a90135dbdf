use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::server::cookies::{read_cookie, SameSite, SetCookie, CSRF_COOKIE};
use crate::server::state::AppState;
use crate::utils::error::EdgeError;

pub const CSRF_HEADER: &str = "x-csrf-token";

/// GET /api/csrf-token
pub async fn issue_csrf_token() -> impl IntoResponse {
    let token = uuid::Uuid::new_v4().to_string();
    let cookie = SetCookie {
        name: CSRF_COOKIE,
        value: &token,
        max_age: None,
        same_site: SameSite::Strict,
        http_only: false,
    }
    .to_string();

    ([(SET_COOKIE, cookie)], Json(json!({ "csrfToken": token })))
}

/// 比較時間不隨第一個不同的位元組而改變
fn tokens_match(sent: &[u8], expected: &[u8]) -> bool {
    sent.len() == expected.len()
        && sent
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

/// Double-submit check: the header must repeat the cookie on every POST.
pub async fn csrf_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.csrf_enabled || request.method() != Method::POST {
        return next.run(request).await;
    }

    let headers = request.headers();
    let header_token = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let cookie_token = read_cookie(headers, CSRF_COOKIE);
    let authorized = matches!(
        (header_token, cookie_token.as_deref()),
        (Some(sent), Some(expected)) if tokens_match(sent.as_bytes(), expected.as_bytes())
    );

    if authorized {
        next.run(request).await
    } else {
        tracing::warn!(
            "Rejected {} {}: CSRF token mismatch",
            request.method(),
            request.uri().path()
        );
        EdgeError::CsrfError.into_response()
    }
}
