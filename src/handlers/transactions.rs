use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Transaction, TransactionKind, TransactionStatus};
use crate::error::AppError;
use crate::format::{DataFormat, FormatError};
use crate::handlers::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize, Serialize)]
pub struct TransactionRequest {
    pub amount: Option<BigDecimal>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StatusResponse {
    pub transaction_id: String,
    pub status: TransactionStatus,
}

/// XML has no numeric type, so amounts arrive as element text.
#[derive(Debug, Deserialize)]
struct XmlTransactionRequest {
    amount: Option<String>,
}

pub async fn deposit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    submit(state, TransactionKind::Deposit, &headers, &body).await
}

pub async fn withdrawal(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    submit(state, TransactionKind::Withdrawal, &headers, &body).await
}

async fn submit(state: AppState, kind: TransactionKind, headers: &HeaderMap, body: &[u8]) -> Response {
    let format = match request_format(headers) {
        Ok(format) => format,
        Err(e) => return e.into_response(),
    };

    match submit_as(state, kind, format, body).await {
        Ok(tx) => format.render(
            StatusCode::OK,
            &ApiResponse::ok("Transaction processed successfully", tx),
        ),
        Err(e) => e.into_response_as(format),
    }
}

async fn submit_as(
    state: AppState,
    kind: TransactionKind,
    format: DataFormat,
    body: &[u8],
) -> Result<Transaction, AppError> {
    let request = decode_request(format, body)?;
    let amount = request
        .amount
        .ok_or_else(|| AppError::Validation("amount: is required".to_string()))?;

    Ok(state
        .pipeline
        .submit(kind, amount, format.content_type())
        .await?)
}

fn decode_request(format: DataFormat, body: &[u8]) -> Result<TransactionRequest, AppError> {
    let invalid = |e: FormatError| AppError::BadRequest(format!("Invalid request body: {}", e));

    if !format.is_xml() {
        return format.decode(body).map_err(invalid);
    }

    let raw: XmlTransactionRequest = format.decode(body).map_err(invalid)?;
    let amount = raw
        .amount
        .map(|text| text.trim().parse::<BigDecimal>())
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: amount: {}", e)))?;

    Ok(TransactionRequest { amount })
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.pipeline.get_status(&transaction_id).await?;

    Ok(Json(StatusResponse {
        transaction_id,
        status,
    }))
}

/// The body format named by the request's `Content-Type`.
pub(crate) fn request_format(headers: &HeaderMap) -> Result<DataFormat, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    DataFormat::from_content_type(content_type)
        .ok_or_else(|| AppError::UnsupportedMediaType(format!("'{}' is not supported", content_type)))
}
