use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use utoipa::ToSchema;

/// Final output of one successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderArtifact {
    pub png: Vec<u8>,
    /// Post-trim size in pixels
    pub width: u32,
    pub height: u32,
    pub processing_time_ms: f64,
    pub trimmed: bool,
    /// Logical font name actually used
    pub font: String,
}

/// Error entry for a failed batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorDescriptor {
    pub code: String,
    pub message: String,
}

impl ErrorDescriptor {
    /// The generic descriptor every failed batch item reports.
    pub fn render_failed() -> Self {
        Self {
            code: "RENDER_ERROR".to_string(),
            message: "Rendering failed".to_string(),
        }
    }
}

/// Per-item outcome of a batch, in submission order.
pub type BatchItemOutcome = Result<RenderArtifact, ErrorDescriptor>;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RenderResponse {
    /// PNG image, standard base64
    pub image_base64: String,
    pub width: u32,
    pub height: u32,
    pub processing_time_ms: f64,
    pub trimmed: bool,
    pub font: String,
}

impl From<RenderArtifact> for RenderResponse {
    fn from(artifact: RenderArtifact) -> Self {
        Self {
            image_base64: STANDARD.encode(&artifact.png),
            width: artifact.width,
            height: artifact.height,
            processing_time_ms: (artifact.processing_time_ms * 100.0).round() / 100.0,
            trimmed: artifact.trimmed,
            font: artifact.font,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum BatchItemResponse {
    Success(RenderResponse),
    Failure { error: ErrorDescriptor },
}

impl From<BatchItemOutcome> for BatchItemResponse {
    fn from(outcome: BatchItemOutcome) -> Self {
        match outcome {
            Ok(artifact) => BatchItemResponse::Success(artifact.into()),
            Err(error) => BatchItemResponse::Failure { error },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchRenderResponse {
    pub results: Vec<BatchItemResponse>,
}
