use super::correlation::ErrorBody;
use super::extract::{ApiJson, Authorized};
use crate::error::ApiError;
use crate::models::{BatchRenderRequest, BatchRenderResponse, RenderRequest, RenderResponse};
use crate::server::AppState;
use axum::{extract::State, Json};

/// Render text vertically to a PNG
///
/// Wraps the text into columns, rasterizes it right to left and trims the
/// transparent border.
#[utoipa::path(
    post,
    path = "/render",
    request_body = RenderRequest,
    responses(
        (status = 200, description = "Rendered image", body = RenderResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Rendering failed", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "Render"
)]
pub async fn handle_render(
    State(state): State<AppState>,
    _auth: Authorized,
    ApiJson(request): ApiJson<RenderRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    request.validate().map_err(ApiError::Validation)?;

    let artifact = state.renderer.render(&request).await?;
    Ok(Json(artifact.into()))
}

/// Render several texts with one resource
///
/// Item fields override `defaults` field by field. A failed item is reported
/// in its slot and does not affect the others.
#[utoipa::path(
    post,
    path = "/render/batch",
    request_body = BatchRenderRequest,
    responses(
        (status = 200, description = "Per-item results in request order", body = BatchRenderResponse),
        (status = 400, description = "Too many items", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 422, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "No render resource available", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "Render"
)]
pub async fn handle_render_batch(
    State(state): State<AppState>,
    _auth: Authorized,
    ApiJson(batch): ApiJson<BatchRenderRequest>,
) -> Result<Json<BatchRenderResponse>, ApiError> {
    let requests = batch.resolve().map_err(ApiError::Validation)?;

    let limit = state.config.render.max_batch_items;
    if requests.len() > limit {
        return Err(ApiError::BadRequest(format!(
            "Too many items: {} given, at most {limit} allowed",
            requests.len()
        )));
    }

    let outcomes = state.renderer.render_batch(&requests).await?;
    Ok(Json(BatchRenderResponse {
        results: outcomes.into_iter().map(Into::into).collect(),
    }))
}
