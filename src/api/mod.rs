pub mod auth;
pub mod correlation;
pub mod debug;
pub mod extract;
pub mod headers;
pub mod info;
pub mod render;

pub use auth::TokenVerifier;
pub use correlation::{correlation_layer, CorrelationId, ErrorBody};
pub use debug::{handle_debug_markup, MarkupQuery, __path_handle_debug_markup};
pub use extract::{ApiJson, Authorized};
pub use info::{handle_health, handle_root, HealthResponse, ServiceInfo, __path_handle_health, __path_handle_root};
pub use render::{handle_render, handle_render_batch, __path_handle_render, __path_handle_render_batch};

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tategaki API",
        description = "Vertical Japanese text rendering service",
        license(name = "MIT")
    ),
    paths(
        render::handle_render,
        render::handle_render_batch,
        debug::handle_debug_markup,
        info::handle_health,
        info::handle_root,
    ),
    components(schemas(
        crate::models::RenderRequest,
        crate::models::RenderOptions,
        crate::models::BatchItem,
        crate::models::BatchRenderRequest,
        crate::models::RenderResponse,
        crate::models::BatchItemResponse,
        crate::models::BatchRenderResponse,
        crate::models::ErrorDescriptor,
        crate::error::FieldError,
        ErrorBody,
        HealthResponse,
        ServiceInfo,
        info::PoolInfo,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Render", description = "Vertical text rendering"),
        (name = "Debug", description = "Markup inspection"),
        (name = "Service", description = "Health and service information")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_render_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/render"));
        assert!(doc.paths.paths.contains_key("/render/batch"));
        assert!(doc.paths.paths.contains_key("/debug/markup"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
        assert!(components.schemas.contains_key("RenderRequest"));
    }
}
