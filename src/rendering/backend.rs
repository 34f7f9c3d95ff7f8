//! Rendering backend abstraction.
//!
//! A backend is a factory for [`RenderResource`]s, the expensive, reusable
//! objects that turn a [`RenderDocument`] into pixels. The resource pool owns
//! their lifecycle; nothing else creates or destroys them.

use crate::error::BackendError;
use async_trait::async_trait;
use tategaki_wrap::CanvasSize;

/// Markup ready for rasterization.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderDocument {
    /// Complete SVG document
    pub markup: String,
    /// Padding kept around the measured content box
    pub padding: u32,
    /// Estimated canvas, used as the document viewport
    pub estimate: CanvasSize,
    /// Number of columns laid out, including blank ones
    pub columns: usize,
}

/// Straight (non-premultiplied) RGBA pixels of the captured container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSurface {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RenderedSurface {
    /// A fully transparent surface.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            rgba: vec![0; width as usize * height as usize * 4],
            width,
            height,
        }
    }
}

#[async_trait]
pub trait RenderResource: Send + 'static {
    /// Render one document, returning the container-sized surface.
    async fn render(&mut self, document: &RenderDocument) -> Result<RenderedSurface, BackendError>;

    /// Clear per-render state so the next borrower starts clean.
    async fn reset(&mut self) -> Result<(), BackendError>;

    /// Release everything the resource holds. Called at most once.
    async fn close(&mut self);
}

#[async_trait]
pub trait RenderBackend: Send + Sync + 'static {
    type Resource: RenderResource;

    /// Create a fresh resource.
    async fn create_resource(&self) -> Result<Self::Resource, BackendError>;

    /// Release backend-wide state after all resources are closed.
    async fn shutdown(&self) {}
}
