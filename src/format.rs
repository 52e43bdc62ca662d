//! Body formats spoken by payment gateways.
//!
//! A request is decoded in the format named by its `Content-Type` and the
//! response (errors included) is encoded in that same format.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Root element used when a response is encoded as XML.
pub const XML_ROOT: &str = "response";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    TextXml,
    ApplicationXml,
}

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl DataFormat {
    /// Parameters such as `; charset=utf-8` are ignored. `None` when the
    /// media type is not supported.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/json" => Some(DataFormat::Json),
            "text/xml" => Some(DataFormat::TextXml),
            "application/xml" => Some(DataFormat::ApplicationXml),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DataFormat::Json => "application/json",
            DataFormat::TextXml => "text/xml",
            DataFormat::ApplicationXml => "application/xml",
        }
    }

    pub fn is_xml(&self) -> bool {
        !matches!(self, DataFormat::Json)
    }

    pub fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, FormatError> {
        if self.is_xml() {
            Ok(quick_xml::de::from_str(std::str::from_utf8(body)?)?)
        } else {
            Ok(serde_json::from_slice(body)?)
        }
    }

    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, FormatError> {
        if self.is_xml() {
            Ok(quick_xml::se::to_string_with_root(XML_ROOT, value)?.into_bytes())
        } else {
            Ok(serde_json::to_vec(value)?)
        }
    }

    /// Encodes `body` as the response, tagged with this format's content type.
    pub fn render<T: Serialize>(&self, status: StatusCode, body: &T) -> Response {
        match self.encode(body) {
            Ok(bytes) => (status, [(header::CONTENT_TYPE, self.content_type())], bytes).into_response(),
            Err(e) => {
                tracing::error!(format = self.content_type(), "Failed to encode response: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
