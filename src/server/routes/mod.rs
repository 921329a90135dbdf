pub mod affiliate;
pub mod images;
pub mod og;
pub mod preferences;
pub mod security;
pub mod translate;

use crate::core::backend::ForwardedResponse;
use crate::utils::error::{EdgeError, Result};
use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

pub async fn health() -> &'static str {
    "OK"
}

/// 解析 JSON 請求內容；格式錯誤一律回 400
pub(crate) fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        EdgeError::validation("Invalid JSON body")
    })
}

/// Canonical spelling of `value` within `allowed`, compared case-insensitively.
pub(crate) fn supported_value(
    field_name: &str,
    value: &str,
    allowed: &[&'static str],
) -> Result<&'static str> {
    allowed
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(value.trim()))
        .ok_or_else(|| EdgeError::validation(format!("Unsupported {}: {}", field_name, value)))
}

/// Hands an upstream answer back to the caller with its status and content type.
pub(crate) fn proxy_response(forwarded: ForwardedResponse) -> Response {
    let status = StatusCode::from_u16(forwarded.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = forwarded
        .content_type
        .unwrap_or_else(|| "application/json".to_string());

    let mut response = (status, forwarded.body).into_response();
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
