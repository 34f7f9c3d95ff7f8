//! Global cap on in-flight conversions.
//!
//! Every single render and every whole batch holds one permit from admission
//! until its resource is released. This bounds work across all callers even
//! when the pool is larger than the desired concurrency.

use crate::error::AdmissionClosed;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub struct ConversionAdmission {
    semaphore: Arc<Semaphore>,
    ceiling: usize,
}

/// Held for the duration of one conversion.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl ConversionAdmission {
    /// A ceiling of zero is treated as one.
    pub fn new(ceiling: usize) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(ceiling)),
            ceiling,
        }
    }

    /// Wait for a permit. Fails only after [`close`](Self::close).
    pub async fn acquire(&self) -> Result<AdmissionPermit, AdmissionClosed> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AdmissionClosed)?;
        Ok(AdmissionPermit { _permit: permit })
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn in_flight(&self) -> usize {
        self.ceiling.saturating_sub(self.semaphore.available_permits())
    }

    /// Reject current waiters and all future acquisitions.
    pub fn close(&self) {
        self.semaphore.close();
    }
}
