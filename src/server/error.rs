use crate::utils::error::EdgeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            EdgeError::ValidationError { message } => (StatusCode::BAD_REQUEST, message.clone()),
            EdgeError::CsrfError => (StatusCode::FORBIDDEN, self.to_string()),
            _ => {
                tracing::error!(
                    "Request failed: {} (Category: {:?}, Severity: {:?})",
                    self,
                    self.category(),
                    self.severity()
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
