use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::TransactionStatus;
use crate::error::AppError;
use crate::format::DataFormat;
use crate::handlers::transactions::request_format;
use crate::handlers::ApiResponse;
use crate::security;
use crate::validation;
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "X-Signature";

#[derive(Debug, Deserialize, Serialize)]
pub struct CallbackPayload {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub status: String,
}

pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let format = match request_format(&headers) {
        Ok(format) => format,
        Err(e) => return e.into_response(),
    };

    match apply(state, &headers, format, &body).await {
        Ok(payload) => format.render(
            StatusCode::OK,
            &ApiResponse::ok("Callback processed successfully", payload),
        ),
        Err(e) => e.into_response_as(format),
    }
}

async fn apply(
    state: AppState,
    headers: &HeaderMap,
    format: DataFormat,
    body: &[u8],
) -> Result<CallbackPayload, AppError> {
    if let Some(secret) = state.callback_secret.as_deref() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();

        if !security::verify_signature(body, secret, signature) {
            return Err(AppError::Unauthorized("Invalid signature".to_string()));
        }
    }

    let mut payload: CallbackPayload = format
        .decode(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    payload.transaction_id = validation::sanitize_string(&payload.transaction_id);

    if payload.status.trim().is_empty() {
        return Err(AppError::Validation("status: is required".to_string()));
    }
    let status: TransactionStatus = payload
        .status
        .trim()
        .parse()
        .map_err(|e| AppError::Validation(format!("{}", e)))?;

    state
        .pipeline
        .apply_callback(&payload.transaction_id, status)
        .await?;

    Ok(payload)
}
