use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use valuation::ValuationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Valuation error: {0}")]
    Valuation(#[from] ValuationError),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // The exchange, not this server, is what failed.
            AppError::Valuation(valuation_err) => {
                tracing::error!(error = %valuation_err, "Wallet refresh failed.");
                (StatusCode::BAD_GATEWAY, valuation_err.to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
