use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::parse_json_body;
use crate::server::state::AppState;
use crate::utils::error::{EdgeError, Result};
use crate::utils::validation::require_field;

pub const MAX_BATCH_KEYS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveBatchRequest {
    #[serde(default)]
    pub keys: Vec<String>,
}

/// GET /api/images/resolve?key=...
pub async fn resolve_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<Value>> {
    let key = require_field("key", &query.key)?;
    let url = state.images.resolve(key).await;
    Ok(Json(json!({ "url": url })))
}

/// POST /api/images/resolve
pub async fn resolve_images(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>> {
    let request: ResolveBatchRequest = parse_json_body(&body)?;
    if request.keys.len() > MAX_BATCH_KEYS {
        return Err(EdgeError::validation(format!(
            "Too many keys ({} > {})",
            request.keys.len(),
            MAX_BATCH_KEYS
        )));
    }

    let urls = state.images.resolve_many(&request.keys).await;
    tracing::debug!(
        "Resolved {} image keys (cache size {})",
        urls.len(),
        state.images.len()
    );
    Ok(Json(json!({ "urls": urls })))
}
