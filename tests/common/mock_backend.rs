//! Instrumented render backend for pool, admission and pipeline tests.
//!
//! Markup containing [`FAIL_MARK`] makes a render fail; markup containing
//! [`HANG_MARK`] makes it sleep far past any test timeout and
//! [`MALFORMED_MARK`] returns a surface whose buffer does not match its size.
//! Single characters survive line wrapping intact. Every other render sleeps for
//! the configured delay and returns a 20x30 surface with a 10x20 opaque block.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tategaki::error::BackendError;
use tategaki::rendering::{RenderBackend, RenderDocument, RenderResource, RenderedSurface};

pub const SURFACE_WIDTH: u32 = 20;
pub const SURFACE_HEIGHT: u32 = 30;
pub const FAIL_MARK: char = '✗';
pub const HANG_MARK: char = '⌛';
pub const MALFORMED_MARK: char = '▦';

#[derive(Debug, Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub closed: AtomicUsize,
    pub resets: AtomicUsize,
    pub renders: AtomicUsize,
    /// Resources currently alive (created and not closed)
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
    /// Renders currently executing
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    /// Remaining creations that fail
    pub fail_creations: AtomicUsize,
    /// Remaining resets that fail
    pub fail_resets: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn bump_max(current: &AtomicUsize, max: &AtomicUsize) {
    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
    max.fetch_max(now, Ordering::SeqCst);
}

#[derive(Clone, Default)]
pub struct MockBackend {
    pub counters: Arc<Counters>,
    pub delay: Duration,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn created(&self) -> usize {
        Counters::get(&self.counters.created)
    }

    pub fn closed(&self) -> usize {
        Counters::get(&self.counters.closed)
    }

    pub fn resets(&self) -> usize {
        Counters::get(&self.counters.resets)
    }

    pub fn renders(&self) -> usize {
        Counters::get(&self.counters.renders)
    }

    pub fn max_live(&self) -> usize {
        Counters::get(&self.counters.max_live)
    }

    pub fn max_active(&self) -> usize {
        Counters::get(&self.counters.max_active)
    }

    pub fn fail_next_creations(&self, n: usize) {
        self.counters.fail_creations.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_resets(&self, n: usize) {
        self.counters.fail_resets.store(n, Ordering::SeqCst);
    }
}

pub struct MockResource {
    pub id: usize,
    counters: Arc<Counters>,
    delay: Duration,
    closed: bool,
}

#[async_trait]
impl RenderBackend for MockBackend {
    type Resource = MockResource;

    async fn create_resource(&self) -> Result<MockResource, BackendError> {
        let failing = self
            .counters
            .fail_creations
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(BackendError::Launch("mock creation failure".into()));
        }

        let id = self.counters.created.fetch_add(1, Ordering::SeqCst);
        bump_max(&self.counters.live, &self.counters.max_live);
        Ok(MockResource {
            id,
            counters: self.counters.clone(),
            delay: self.delay,
            closed: false,
        })
    }
}

/// Decrements the active-render gauge when a render ends or is cancelled.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RenderResource for MockResource {
    async fn render(&mut self, document: &RenderDocument) -> Result<RenderedSurface, BackendError> {
        if self.closed {
            return Err(BackendError::Closed);
        }
        bump_max(&self.counters.active, &self.counters.max_active);
        let _active = ActiveGuard(&self.counters.active);
        self.counters.renders.fetch_add(1, Ordering::SeqCst);

        if document.markup.contains(HANG_MARK) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if document.markup.contains(FAIL_MARK) {
            return Err(BackendError::Document("mock render failure".into()));
        }

        if document.markup.contains(MALFORMED_MARK) {
            return Ok(RenderedSurface {
                rgba: vec![0, 0, 0, 255],
                width: SURFACE_WIDTH,
                height: SURFACE_HEIGHT,
            });
        }

        let mut surface = RenderedSurface::transparent(SURFACE_WIDTH, SURFACE_HEIGHT);
        for y in 5..25 {
            for x in 5..15 {
                let i = ((y * SURFACE_WIDTH + x) * 4) as usize;
                surface.rgba[i..i + 4].copy_from_slice(&[0, 0, 0, 255]);
            }
        }
        Ok(surface)
    }

    async fn reset(&mut self) -> Result<(), BackendError> {
        self.counters.resets.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .counters
            .fail_resets
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            Err(BackendError::Reset("mock reset failure".into()))
        } else {
            Ok(())
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
