//! In-process rasterizer backed by resvg.
//!
//! Each [`ResvgSession`] keeps a reusable canvas between renders. A session
//! captures only the content container: the bounding box of the
//! `#content` group grown by the document padding.

use super::backend::{RenderBackend, RenderDocument, RenderResource, RenderedSurface};
use crate::error::BackendError;
use async_trait::async_trait;
use resvg::usvg::{self, Transform};
use std::sync::Arc;
use tiny_skia::{Color, Pixmap};

/// Id of the group whose bounding box is the measured content.
pub const CONTENT_ID: &str = "content";

/// Largest surface edge a session will allocate.
pub const MAX_SURFACE_EDGE: u32 = 16_384;

/// Canvases above this many pixels are dropped on reset rather than kept.
const RETAINED_CANVAS_PIXELS: u64 = 4_000_000;

/// Creates sessions that share one font database.
#[derive(Clone)]
pub struct ResvgBackend {
    fontdb: Arc<fontdb::Database>,
}

impl ResvgBackend {
    pub fn new(fontdb: Arc<fontdb::Database>) -> Self {
        Self { fontdb }
    }

    pub fn font_count(&self) -> usize {
        self.fontdb.len()
    }
}

#[async_trait]
impl RenderBackend for ResvgBackend {
    type Resource = ResvgSession;

    async fn create_resource(&self) -> Result<ResvgSession, BackendError> {
        tracing::debug!(fonts = self.fontdb.len(), "Creating render session");
        Ok(ResvgSession {
            fontdb: self.fontdb.clone(),
            canvas: None,
            renders: 0,
            closed: false,
        })
    }

    async fn shutdown(&self) {
        tracing::info!("Render backend shut down");
    }
}

pub struct ResvgSession {
    fontdb: Arc<fontdb::Database>,
    canvas: Option<Pixmap>,
    renders: u64,
    closed: bool,
}

impl ResvgSession {
    /// Renders completed by this session.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn has_canvas(&self) -> bool {
        self.canvas.is_some()
    }
}

#[async_trait]
impl RenderResource for ResvgSession {
    async fn render(&mut self, document: &RenderDocument) -> Result<RenderedSurface, BackendError> {
        if self.closed {
            return Err(BackendError::Closed);
        }

        let fontdb = self.fontdb.clone();
        let markup = document.markup.clone();
        let padding = document.padding;
        let canvas = self.canvas.take();

        // Rasterization is CPU-bound
        let (canvas, result) = tokio::task::spawn_blocking(move || rasterize(fontdb, &markup, padding, canvas))
            .await
            .map_err(|e| BackendError::Task(e.to_string()))?;

        self.canvas = canvas;
        self.renders += 1;
        result
    }

    async fn reset(&mut self) -> Result<(), BackendError> {
        if self.closed {
            return Err(BackendError::Closed);
        }

        let oversized = self
            .canvas
            .as_ref()
            .is_some_and(|c| u64::from(c.width()) * u64::from(c.height()) > RETAINED_CANVAS_PIXELS);
        if oversized {
            self.canvas = None;
        } else if let Some(canvas) = self.canvas.as_mut() {
            canvas.fill(Color::TRANSPARENT);
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
        self.canvas = None;
        tracing::debug!(renders = self.renders, "Render session closed");
    }
}

/// Region of the document that becomes the output surface.
#[derive(Debug, Clone, Copy)]
struct ContainerFrame {
    width: u32,
    height: u32,
    transform: Transform,
}

impl ContainerFrame {
    fn measure(tree: &usvg::Tree, padding: u32) -> Self {
        let pad = padding as f32;
        let content = tree
            .node_by_id(CONTENT_ID)
            .map(|node| node.abs_bounding_box())
            .filter(|bbox| bbox.width() > 0.0 && bbox.height() > 0.0);

        match content {
            Some(bbox) => Self {
                width: (bbox.width() + pad * 2.0).ceil() as u32,
                height: (bbox.height() + pad * 2.0).ceil() as u32,
                transform: Transform::from_translate(pad - bbox.left(), pad - bbox.top()),
            },
            // Nothing drawn: capture the whole viewport
            None => {
                let size = tree.size();
                Self {
                    width: (size.width().ceil() as u32).max(1),
                    height: (size.height().ceil() as u32).max(1),
                    transform: Transform::identity(),
                }
            }
        }
    }
}

/// Parse and rasterize `markup`, handing the canvas back for reuse.
fn rasterize(
    fontdb: Arc<fontdb::Database>,
    markup: &str,
    padding: u32,
    canvas: Option<Pixmap>,
) -> (Option<Pixmap>, Result<RenderedSurface, BackendError>) {
    let options = usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = match usvg::Tree::from_str(markup, &options) {
        Ok(tree) => tree,
        Err(e) => return (canvas, Err(BackendError::Document(e.to_string()))),
    };

    let frame = ContainerFrame::measure(&tree, padding);
    let allocation_error = BackendError::PixmapAllocation {
        width: frame.width,
        height: frame.height,
    };
    if frame.width > MAX_SURFACE_EDGE || frame.height > MAX_SURFACE_EDGE {
        return (canvas, Err(allocation_error));
    }

    let mut pixmap = match canvas {
        Some(existing) if existing.width() == frame.width && existing.height() == frame.height => existing,
        _ => match Pixmap::new(frame.width, frame.height) {
            Some(pixmap) => pixmap,
            None => return (None, Err(allocation_error)),
        },
    };
    pixmap.fill(Color::TRANSPARENT);
    resvg::render(&tree, frame.transform, &mut pixmap.as_mut());

    let rgba = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let c = pixel.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    let surface = RenderedSurface {
        rgba,
        width: frame.width,
        height: frame.height,
    };
    (Some(pixmap), Ok(surface))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tategaki_wrap::CanvasSize;

    fn document(markup: &str, padding: u32) -> RenderDocument {
        RenderDocument {
            markup: markup.to_string(),
            padding,
            estimate: CanvasSize {
                width: 200,
                height: 200,
            },
            columns: 1,
        }
    }

    fn alpha_at(surface: &RenderedSurface, x: u32, y: u32) -> u8 {
        surface.rgba[((y * surface.width + x) * 4 + 3) as usize]
    }

    async fn session() -> ResvgSession {
        ResvgBackend::new(Arc::new(fontdb::Database::new()))
            .create_resource()
            .await
            .unwrap()
    }

    const RECT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200" viewBox="0 0 200 200"><g id="content"><rect x="50" y="60" width="30" height="40" fill="#000000"/></g></svg>"##;

    #[tokio::test]
    async fn test_surface_is_content_box_plus_padding() {
        let mut session = session().await;
        let surface = session.render(&document(RECT_SVG, 10)).await.unwrap();

        assert_eq!((surface.width, surface.height), (50, 60));
        assert_eq!(surface.rgba.len(), 50 * 60 * 4);
        assert_eq!(alpha_at(&surface, 0, 0), 0);
        assert_eq!(alpha_at(&surface, 25, 30), 255);
        assert_eq!(session.renders(), 1);
        assert!(session.has_canvas());
    }

    #[tokio::test]
    async fn test_empty_content_captures_viewport() {
        let mut session = session().await;
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="220" height="240"><g id="content"></g></svg>"#;
        let surface = session.render(&document(svg, 20)).await.unwrap();

        assert_eq!((surface.width, surface.height), (220, 240));
        assert!(surface.rgba.chunks_exact(4).all(|p| p[3] == 0));
    }

    #[tokio::test]
    async fn test_invalid_markup_is_document_error() {
        let mut session = session().await;
        let err = session.render(&document("<svg", 0)).await.unwrap_err();
        assert!(matches!(err, BackendError::Document(_)));
        // The session stays usable
        assert!(session.render(&document(RECT_SVG, 0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_keeps_small_canvas() {
        let mut session = session().await;
        session.render(&document(RECT_SVG, 0)).await.unwrap();
        session.reset().await.unwrap();
        assert!(session.has_canvas());
    }

    #[tokio::test]
    async fn test_closed_session_refuses_work() {
        let mut session = session().await;
        session.close().await;
        assert!(matches!(session.render(&document(RECT_SVG, 0)).await, Err(BackendError::Closed)));
        assert!(matches!(session.reset().await, Err(BackendError::Closed)));
        assert!(!session.has_canvas());
    }
}
