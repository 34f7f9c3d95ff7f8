use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldError {
    /// Dotted location of the field, e.g. `items.2.font_size`
    pub loc: String,
    /// Human-readable reason
    pub msg: String,
}

impl FieldError {
    pub fn new(loc: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            msg: msg.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Rendering error: {0}")]
    Render(#[from] PipelineError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error body before the correlation middleware stamps it.
///
/// Stored as a response extension so the middleware can rebuild the body
/// with the request's correlation ID.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ApiError {
    /// Status, stable error code and the caller-facing message.
    ///
    /// Render and internal failures carry a generic message only; the
    /// underlying cause is logged by the handler, never returned.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized".into()),
            ApiError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                "Validation failed".into(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", "Not Found".into()),
            ApiError::Render(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".into(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let errors = match self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        };
        let payload = ErrorPayload {
            code,
            message,
            errors,
        };

        let mut response = (status, Json(payload.clone())).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response.extensions_mut().insert(payload);
        response
    }
}

/// Failures reported by a rendering backend or one of its resources.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Backend failed to start: {0}")]
    Launch(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Failed to allocate pixmap {width}x{height}")]
    PixmapAllocation { width: u32, height: u32 },

    #[error("Reset failed: {0}")]
    Reset(String),

    #[error("Resource is closed")]
    Closed,

    #[error("Render task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Failed to create render resource: {0}")]
    Creation(#[source] BackendError),

    #[error("Resource pool is shut down")]
    Closed,
}

#[derive(Debug, Error)]
#[error("Admission gate is closed")]
pub struct AdmissionClosed;

/// Malformed bitmap handed to the trimmer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrimError {
    #[error("Empty surface: {width}x{height}")]
    EmptySurface { width: u32, height: u32 },

    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    BufferMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("Trim error: {0}")]
    Trim(#[from] TrimError),
}

/// Anything that can fail between a request and its artifact.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Markup error: {0}")]
    Markup(#[source] RenderError),

    #[error(transparent)]
    Admission(#[from] AdmissionClosed),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("Render timed out after {0:?}")]
    RenderTimeout(Duration),

    #[error("Render failed: {0}")]
    Render(#[from] BackendError),

    #[error("Post-processing failed: {0}")]
    PostProcess(#[source] RenderError),

    #[error("Post-processing task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// Short stage label for operator logs.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Markup(_) => "markup",
            PipelineError::Admission(_) => "admission",
            PipelineError::Pool(_) => "pool",
            PipelineError::RenderTimeout(_) | PipelineError::Render(_) => "render",
            PipelineError::PostProcess(_) | PipelineError::Task(_) => "post_process",
        }
    }
}
