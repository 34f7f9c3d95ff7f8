use super::correlation::ErrorBody;
use super::extract::Authorized;
use crate::error::{ApiError, FieldError};
use crate::models::RenderRequest;
use crate::server::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MarkupQuery {
    /// Text to lay out; a two-line sample when omitted
    #[serde(default = "default_markup_text")]
    pub text: String,
    pub font_size: Option<u32>,
    pub max_chars_per_line: Option<usize>,
    /// Logical font name
    pub font: Option<String>,
}

fn default_markup_text() -> String {
    "テスト文字列\n縦書きのテストです。".to_string()
}

/// Show the generated SVG markup
///
/// Runs wrapping and markup generation only; nothing is rasterized.
#[utoipa::path(
    get,
    path = "/debug/markup",
    params(MarkupQuery),
    responses(
        (status = 200, description = "SVG document", content_type = "image/svg+xml"),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 422, description = "Invalid parameters", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "Debug"
)]
pub async fn handle_debug_markup(
    State(state): State<AppState>,
    _auth: Authorized,
    query: Result<Query<MarkupQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Validation(vec![FieldError::new("query", e.body_text())]))?;

    let mut request = RenderRequest::new(query.text);
    request.font = query.font;
    request.max_chars_per_line = query.max_chars_per_line;
    if let Some(size) = query.font_size {
        request.font_size = size;
    }
    request.validate().map_err(ApiError::Validation)?;

    let prepared = state.renderer.prepare(&request)?;
    tracing::debug!(
        lines = prepared.lines.len(),
        font = %prepared.font.name,
        width = prepared.document.estimate.width,
        height = prepared.document.estimate.height,
        "Generated debug markup"
    );

    Ok(([(CONTENT_TYPE, "image/svg+xml; charset=utf-8")], prepared.document.markup))
}
