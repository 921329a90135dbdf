use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, response::Response};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{parse_json_body, proxy_response, supported_value};
use crate::domain::model::SUPPORTED_LANGUAGES;
use crate::server::state::AppState;
use crate::utils::error::{EdgeError, Result};
use crate::utils::validation::{require_field, validate_max_chars};

pub const MAX_TEXT_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: Option<String>,
    #[serde(alias = "target_lang")]
    pub target_lang: Option<String>,
    #[serde(alias = "source_lang")]
    pub source_lang: Option<String>,
}

/// POST /api/translate
pub async fn translate(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response> {
    let request: TranslateRequest = parse_json_body(&body)?;

    let text = request
        .text
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| EdgeError::validation("text is required"))?;
    validate_max_chars("text", text, MAX_TEXT_CHARS)?;
    let target_lang = supported_value(
        "targetLang",
        require_field("targetLang", &request.target_lang)?,
        SUPPORTED_LANGUAGES,
    )?;

    let mut payload = json!({ "text": text, "targetLang": target_lang });
    if let Some(source) = request.source_lang.as_deref().map(str::trim) {
        if !source.is_empty() {
            payload["sourceLang"] = json!(source);
        }
    }

    tracing::debug!(
        "Translating {} chars into {}",
        text.chars().count(),
        target_lang
    );
    let forwarded = state
        .backend
        .forward(Method::POST, "/translate", Some(&payload), &HeaderMap::new())
        .await?;

    if !forwarded.is_success() {
        tracing::warn!("Translate upstream answered {}", forwarded.status);
    }
    Ok(proxy_response(forwarded))
}
