//! Correlation IDs and the unified error body.
//!
//! Every response carries `X-Correlation-ID`, echoing the caller's value or a
//! fresh 32-hex-digit ID. Error responses built from [`ApiError`] get their
//! body rewritten to `{code, message, correlationId, errors?}`.
//!
//! [`ApiError`]: crate::error::ApiError

use super::headers::{HeaderMapExt, CORRELATION_ID_HEADER};
use crate::error::{ErrorPayload, FieldError};
use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use rand::RngCore;
use serde::Serialize;
use tracing::Instrument;
use utoipa::ToSchema;

/// Correlation ID of the current request, available as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `VALIDATION_ERROR`
    pub code: String,
    pub message: String,
    pub correlation_id: String,
    /// Per-field problems, for validation errors only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

pub async fn correlation_layer(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .correlation_id()
        .map(|id| CorrelationId(id.to_string()))
        .unwrap_or_else(CorrelationId::generate);
    request.extensions_mut().insert(id.clone());

    let span = tracing::info_span!("request", correlation_id = %id.0);
    let mut response = next.run(request).instrument(span).await;

    if let Some(payload) = response.extensions_mut().remove::<ErrorPayload>() {
        stamp_error_body(&mut response, payload, &id);
    }
    if let Ok(value) = HeaderValue::from_str(&id.0) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

fn stamp_error_body(response: &mut Response, payload: ErrorPayload, id: &CorrelationId) {
    let body = ErrorBody {
        code: payload.code.to_string(),
        message: payload.message,
        correlation_id: id.0.clone(),
        errors: payload.errors,
    };
    match serde_json::to_vec(&body) {
        Ok(bytes) => {
            *response.body_mut() = Body::from(bytes);
            let headers = response.headers_mut();
            headers.remove(CONTENT_LENGTH);
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Err(e) => tracing::error!(error = %e, "Failed to serialize error body"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_32_hex() {
        let a = CorrelationId::generate();
        let b = CorrelationId::generate();
        assert_eq!(a.0.len(), 32);
        assert!(a.0.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_error_body_field_names() {
        let body = ErrorBody {
            code: "NOT_FOUND".into(),
            message: "Not Found".into(),
            correlation_id: "abc".into(),
            errors: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["correlationId"], "abc");
        assert!(value.get("errors").is_none());
    }
}
