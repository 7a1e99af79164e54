use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use country_context_core::CountryContextError;
use serde_json::json;
use tracing::error;

/// A country context failure surfacing at the HTTP boundary.
///
/// Every variant is a server-side fault (unbalanced hooks, a code missing from
/// the name table), so all of them map to `500 Internal Server Error`.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub CountryContextError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "country context error");
        let body = Json(json!({ "error": self.0.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
