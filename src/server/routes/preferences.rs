use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::{parse_json_body, supported_value};
use crate::domain::model::{SUPPORTED_CURRENCIES, SUPPORTED_LANGUAGES};
use crate::server::cookies::{read_cookie, SetCookie, CURRENCY_COOKIE, LANGUAGE_COOKIE};
use crate::server::state::AppState;
use crate::utils::error::Result;
use crate::utils::validation::require_field;

#[derive(Debug, Deserialize)]
pub struct CurrencyRequest {
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: Option<String>,
}

/// Cookie value when it names a supported option, else the configured default.
fn preferred(
    headers: &HeaderMap,
    cookie: &str,
    allowed: &[&'static str],
    fallback: &str,
) -> String {
    read_cookie(headers, cookie)
        .and_then(|value| supported_value(cookie, &value, allowed).ok())
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

/// GET /api/currency
pub async fn get_currency(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let currency = preferred(
        &headers,
        CURRENCY_COOKIE,
        SUPPORTED_CURRENCIES,
        &state.config.default_currency,
    );
    Json(json!({ "currency": currency }))
}

/// POST /api/currency
pub async fn set_currency(body: Bytes) -> Result<impl IntoResponse> {
    let request: CurrencyRequest = parse_json_body(&body)?;
    let currency = supported_value(
        "currency",
        require_field("currency", &request.currency)?,
        SUPPORTED_CURRENCIES,
    )?;

    tracing::debug!("Currency preference set to {}", currency);
    Ok((
        [(SET_COOKIE, SetCookie::preference(CURRENCY_COOKIE, currency).to_string())],
        Json(json!({ "success": true, "currency": currency })),
    ))
}

/// GET /api/language
pub async fn get_language(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let language = preferred(
        &headers,
        LANGUAGE_COOKIE,
        SUPPORTED_LANGUAGES,
        &state.config.default_language,
    );
    Json(json!({ "language": language }))
}

/// POST /api/language
pub async fn set_language(body: Bytes) -> Result<impl IntoResponse> {
    let request: LanguageRequest = parse_json_body(&body)?;
    let language = supported_value(
        "language",
        require_field("language", &request.language)?,
        SUPPORTED_LANGUAGES,
    )?;

    tracing::debug!("Language preference set to {}", language);
    Ok((
        [(SET_COOKIE, SetCookie::preference(LANGUAGE_COOKIE, language).to_string())],
        Json(json!({ "success": true, "language": language })),
    ))
}
