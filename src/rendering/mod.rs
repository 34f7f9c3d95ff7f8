pub mod backend;
pub mod markup;
pub mod resvg_backend;
pub mod trim;

pub use backend::{RenderBackend, RenderDocument, RenderResource, RenderedSurface};
pub use markup::{LayoutParams, MarkupGenerator, VerticalDecorator};
pub use resvg_backend::{ResvgBackend, ResvgSession, CONTENT_ID, MAX_SURFACE_EDGE};
pub use trim::{encode_png, trim_transparent, TrimmedImage};
