//! Owns the pool and the admission gate for the lifetime of the process.

use super::admission::ConversionAdmission;
use super::pool::ResourcePool;
use crate::models::PoolSettings;
use crate::rendering::RenderBackend;
use std::time::Duration;

pub struct RenderContext<B: RenderBackend> {
    pool: ResourcePool<B>,
    admission: ConversionAdmission,
    render_timeout: Duration,
}

impl<B: RenderBackend> RenderContext<B> {
    /// Build the pool and admission gate, pre-creating resources if asked.
    pub async fn start(settings: PoolSettings, backend: B) -> Self {
        let pool = ResourcePool::new(backend, settings.pool_size);
        if settings.precreate {
            pool.precreate().await;
        }

        tracing::info!(
            pool_size = pool.capacity(),
            max_concurrency = settings.max_concurrency,
            render_timeout_secs = settings.render_timeout.as_secs(),
            "Render context started"
        );

        Self {
            pool,
            admission: ConversionAdmission::new(settings.max_concurrency),
            render_timeout: settings.render_timeout,
        }
    }

    pub fn pool(&self) -> &ResourcePool<B> {
        &self.pool
    }

    pub fn admission(&self) -> &ConversionAdmission {
        &self.admission
    }

    pub fn render_timeout(&self) -> Duration {
        self.render_timeout
    }

    /// Stop admitting work and close every resource.
    pub async fn shutdown(&self) {
        self.admission.close();
        self.pool.shutdown().await;
    }
}
