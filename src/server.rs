//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::api::{self, TokenVerifier};
use crate::assets::AssetLoader;
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::rendering::{RenderBackend, ResvgBackend};
use crate::services::{FontCatalog, RenderContext, RenderPipeline, TextRenderer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<dyn TextRenderer>,
    pub auth: Arc<TokenVerifier>,
    pub config: Arc<AppConfig>,
}

/// Create application state backed by the resvg rasterizer.
///
/// Fonts are preloaded and, when configured, the pool is filled before this
/// returns.
pub async fn create_app_state(config: AppConfig, asset_loader: &AssetLoader) -> anyhow::Result<AppState> {
    let mut fontdb = fontdb::Database::new();
    let fonts = FontCatalog::load(&config.fonts, asset_loader, &mut fontdb);
    let backend = ResvgBackend::new(Arc::new(fontdb));

    create_app_state_with_backend(config, backend, fonts).await
}

/// Create application state around any backend.
pub async fn create_app_state_with_backend<B: RenderBackend>(
    config: AppConfig,
    backend: B,
    fonts: FontCatalog,
) -> anyhow::Result<AppState> {
    let context = RenderContext::start(config.render.pool_settings(), backend).await;
    let pipeline = RenderPipeline::new(context, Arc::new(fonts))
        .map_err(|e| anyhow::anyhow!("Failed to create render pipeline: {e}"))?;

    Ok(AppState {
        renderer: Arc::new(pipeline),
        auth: Arc::new(TokenVerifier::new(config.server.api_token.as_deref())),
        config: Arc::new(config),
    })
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::handle_root))
        .route("/health", get(api::handle_health))
        .route("/render", post(api::handle_render))
        .route("/render/batch", post(api::handle_render_batch))
        .route("/debug/markup", get(api::handle_debug_markup))
        .fallback(|| async { ApiError::NotFound })
        .with_state(state)
        .layer(middleware::from_fn(api::correlation_layer))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            axum::http::header::CACHE_CONTROL,
            axum::http::HeaderValue::from_static("no-store"),
        ))
}
