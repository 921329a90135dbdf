use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{REFERER, USER_AGENT},
        HeaderMap,
    },
    response::Response,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_json_body, proxy_response};
use crate::server::state::AppState;
use crate::utils::error::{EdgeError, Result};
use crate::utils::validation::validate_max_chars;

pub const MAX_ID_CHARS: usize = 128;
pub const MAX_URL_CHARS: usize = 2048;
pub const MAX_SOURCE_CHARS: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateClickRequest {
    pub product_id: Option<Value>,
    pub store_id: Option<Value>,
    pub url: Option<String>,
    pub source: Option<String>,
}

/// 商品與商店 id 可能是字串或數字
fn id_field(field_name: &str, value: &Option<Value>) -> Result<String> {
    let id = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if id.is_empty() {
        return Err(EdgeError::validation(format!("{} is required", field_name)));
    }
    validate_max_chars(field_name, &id, MAX_ID_CHARS)?;
    Ok(id)
}

fn outbound_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    validate_max_chars("url", raw, MAX_URL_CHARS)?;
    match url::Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(raw.to_string()),
        _ => Err(EdgeError::validation("url must be an http(s) URL")),
    }
}

/// POST /api/affiliate/click
pub async fn affiliate_click(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let request: AffiliateClickRequest = parse_json_body(&body)?;
    let product_id = id_field("productId", &request.product_id)?;
    let store_id = id_field("storeId", &request.store_id)?;

    let mut payload = json!({
        "productId": product_id,
        "storeId": store_id,
        "clickedAt": chrono::Utc::now().to_rfc3339(),
    });
    if let Some(url) = request.url.as_deref().filter(|u| !u.trim().is_empty()) {
        payload["url"] = json!(outbound_url(url)?);
    }
    if let Some(source) = request.source.as_deref().map(str::trim) {
        if !source.is_empty() {
            validate_max_chars("source", source, MAX_SOURCE_CHARS)?;
            payload["source"] = json!(source);
        }
    }

    let mut forwarded_headers = HeaderMap::new();
    for name in [USER_AGENT, REFERER] {
        if let Some(value) = headers.get(&name) {
            forwarded_headers.insert(name, value.clone());
        }
    }

    tracing::info!("Affiliate click: product={} store={}", product_id, store_id);
    let forwarded = state
        .backend
        .forward(Method::POST, "/affiliate/click", Some(&payload), &forwarded_headers)
        .await?;
    Ok(proxy_response(forwarded))
}
