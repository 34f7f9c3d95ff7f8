//! Request to PNG: font resolution, wrapping, markup, rasterization, trim
//! and encoding.
//!
//! A single render takes one admission permit and one pooled resource. A
//! batch takes one permit and one resource for all of its items; a failing
//! item is reported in place and never aborts the rest.

use super::context::RenderContext;
use super::fonts::{FontCatalog, ResolvedFont};
use super::pool::{PoolStats, PooledResource, ReleaseOutcome};
use crate::error::{BackendError, PipelineError, RenderError};
use crate::models::{BatchItemOutcome, ErrorDescriptor, RenderArtifact, RenderRequest};
use crate::rendering::{
    encode_png, trim_transparent, MarkupGenerator, RenderBackend, RenderDocument, RenderResource, RenderedSurface,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tategaki_wrap::{wrap, PhraseSegmenter, Segmenter};

const WARMUP_TEXT: &str = "縦書きの準備運動です。";

/// Everything computed before a resource is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRender {
    pub font: ResolvedFont,
    pub lines: Vec<String>,
    pub document: RenderDocument,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererStatus {
    pub pool: PoolStats,
    pub in_flight: usize,
    pub max_concurrency: usize,
    pub fonts: Vec<String>,
    pub default_font: String,
}

/// Object-safe face of the pipeline, used by the HTTP layer.
#[async_trait]
pub trait TextRenderer: Send + Sync {
    fn prepare(&self, request: &RenderRequest) -> Result<PreparedRender, PipelineError>;

    async fn render(&self, request: &RenderRequest) -> Result<RenderArtifact, PipelineError>;

    /// Fails as a whole only when no resource could be obtained.
    async fn render_batch(&self, requests: &[RenderRequest]) -> Result<Vec<BatchItemOutcome>, PipelineError>;

    async fn warmup(&self) -> Result<(), PipelineError>;

    fn status(&self) -> RendererStatus;

    async fn shutdown(&self);
}

pub struct RenderPipeline<B: RenderBackend> {
    context: RenderContext<B>,
    markup: MarkupGenerator,
    fonts: Arc<FontCatalog>,
    segmenter: Arc<dyn Segmenter>,
}

impl<B: RenderBackend> RenderPipeline<B> {
    pub fn new(context: RenderContext<B>, fonts: Arc<FontCatalog>) -> Result<Self, RenderError> {
        Ok(Self {
            context,
            markup: MarkupGenerator::new()?,
            fonts,
            segmenter: Arc::new(PhraseSegmenter),
        })
    }

    /// Replace the default phrase segmenter.
    pub fn with_segmenter(mut self, segmenter: Arc<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn context(&self) -> &RenderContext<B> {
        &self.context
    }

    fn prepare_document(&self, request: &RenderRequest) -> Result<PreparedRender, PipelineError> {
        let font = self.fonts.resolve(request.font.as_deref());
        let wrapped = wrap(&request.text, request.max_chars_per_line, self.segmenter.as_ref());
        let document = self
            .markup
            .build(&wrapped, &request.layout(), font.family.as_deref())
            .map_err(PipelineError::Markup)?;

        Ok(PreparedRender {
            font,
            lines: wrapped.lines,
            document,
        })
    }

    async fn render_single(&self, request: &RenderRequest) -> Result<RenderArtifact, PipelineError> {
        let started = Instant::now();
        let prepared = self.prepare_document(request)?;

        // Resource and permit are given back before trimming
        let surface = {
            let _permit = self.context.admission().acquire().await?;
            let mut lease = self.context.pool().acquire().await?;
            let rendered = self.rasterize(&mut lease, &prepared.document).await;
            self.release(lease).await;
            rendered?
        };
        finish(surface, prepared.font, started).await
    }

    async fn render_many(&self, requests: &[RenderRequest]) -> Result<Vec<BatchItemOutcome>, PipelineError> {
        let _permit = self.context.admission().acquire().await?;
        let mut lease = self.context.pool().acquire().await?;
        let mut outcomes = Vec::with_capacity(requests.len());

        // One lease for every item; a broken one is replaced on release
        for (index, request) in requests.iter().enumerate() {
            let outcome = self.render_with(&mut lease, request).await;
            outcomes.push(outcome.map_err(|e| {
                log_failure(&e, request, Some(index));
                ErrorDescriptor::render_failed()
            }));
        }

        self.release(lease).await;
        Ok(outcomes)
    }

    async fn release(&self, lease: PooledResource<B::Resource>) {
        let broken = lease.is_broken();
        match self.context.pool().release(lease).await {
            ReleaseOutcome::Reused => {}
            ReleaseOutcome::Replaced => tracing::debug!(broken, "Render resource replaced on release"),
            ReleaseOutcome::Dropped => tracing::warn!(
                broken,
                stats = ?self.context.pool().stats(),
                "Render resource dropped on release, pool below capacity"
            ),
        }
    }

    async fn render_with(
        &self,
        lease: &mut PooledResource<B::Resource>,
        request: &RenderRequest,
    ) -> Result<RenderArtifact, PipelineError> {
        let started = Instant::now();
        let prepared = self.prepare_document(request)?;
        let surface = self.rasterize(lease, &prepared.document).await?;
        finish(surface, prepared.font, started).await
    }

    async fn rasterize(
        &self,
        lease: &mut PooledResource<B::Resource>,
        document: &RenderDocument,
    ) -> Result<RenderedSurface, PipelineError> {
        let timeout = self.context.render_timeout();
        match tokio::time::timeout(timeout, lease.resource_mut().render(document)).await {
            Ok(Ok(surface)) => Ok(surface),
            Ok(Err(e)) => {
                if matches!(e, BackendError::Closed | BackendError::Task(_)) {
                    lease.mark_broken();
                }
                Err(e.into())
            }
            Err(_) => {
                lease.mark_broken();
                Err(PipelineError::RenderTimeout(timeout))
            }
        }
    }
}

/// Trim and encode off the async runtime.
async fn finish(surface: RenderedSurface, font: ResolvedFont, started: Instant) -> Result<RenderArtifact, PipelineError> {
    let (image, png) = tokio::task::spawn_blocking(move || -> Result<_, RenderError> {
        let image = trim_transparent(surface)?;
        let png = encode_png(&image)?;
        Ok((image, png))
    })
    .await
    .map_err(|e| PipelineError::Task(e.to_string()))?
    .map_err(PipelineError::PostProcess)?;

    Ok(RenderArtifact {
        png,
        width: image.width,
        height: image.height,
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        trimmed: image.trimmed,
        font: font.name,
    })
}

fn log_failure(error: &PipelineError, request: &RenderRequest, index: Option<usize>) {
    tracing::error!(
        stage = error.stage(),
        error = %error,
        index = ?index,
        text_len = request.text.chars().count(),
        font = ?request.font,
        font_size = request.font_size,
        line_height = request.line_height,
        letter_spacing = request.letter_spacing,
        padding = request.padding,
        max_chars_per_line = ?request.max_chars_per_line,
        "Render failed"
    );
}

#[async_trait]
impl<B: RenderBackend> TextRenderer for RenderPipeline<B> {
    fn prepare(&self, request: &RenderRequest) -> Result<PreparedRender, PipelineError> {
        self.prepare_document(request)
    }

    async fn render(&self, request: &RenderRequest) -> Result<RenderArtifact, PipelineError> {
        let result = self.render_single(request).await;
        match &result {
            Ok(artifact) => tracing::debug!(
                width = artifact.width,
                height = artifact.height,
                font = %artifact.font,
                ms = artifact.processing_time_ms,
                "Rendered"
            ),
            Err(e) => log_failure(e, request, None),
        }
        result
    }

    async fn render_batch(&self, requests: &[RenderRequest]) -> Result<Vec<BatchItemOutcome>, PipelineError> {
        let outcomes = self.render_many(requests).await?;
        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        tracing::info!(items = outcomes.len(), failed, "Batch rendered");
        Ok(outcomes)
    }

    async fn warmup(&self) -> Result<(), PipelineError> {
        let started = Instant::now();
        self.render(&RenderRequest::new(WARMUP_TEXT)).await?;
        tracing::info!(ms = started.elapsed().as_millis() as u64, "Warm-up render complete");
        Ok(())
    }

    fn status(&self) -> RendererStatus {
        RendererStatus {
            pool: self.context.pool().stats(),
            in_flight: self.context.admission().in_flight(),
            max_concurrency: self.context.admission().ceiling(),
            fonts: self.fonts.names().map(str::to_string).collect(),
            default_font: self.fonts.default_name().to_string(),
        }
    }

    async fn shutdown(&self) {
        self.context.shutdown().await;
    }
}
