//! Bounded pool of reusable render resources.
//!
//! At most `capacity` resources are alive at any time, counting idle ones,
//! leased ones and ones being healed after a failed reset. Resources are
//! created lazily (or up front with [`ResourcePool::precreate`]) and a lease
//! dropped without [`ResourcePool::release`] forfeits its slot instead of
//! leaking it.

use crate::error::PoolError;
use crate::rendering::{RenderBackend, RenderResource};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// What happened to a resource on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Reset succeeded and the resource went back to the idle queue
    Reused,
    /// The resource was discarded and a fresh one took its place
    Replaced,
    /// The slot was given up (replacement failed or the pool is closed)
    Dropped,
}

/// Point-in-time pool bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub capacity: usize,
    /// Live resources, including leased and healing ones
    pub created: usize,
    pub idle: usize,
    pub in_use: usize,
}

struct PoolState<R> {
    idle: VecDeque<R>,
    created: usize,
    in_use: usize,
    closed: bool,
}

struct Shared<R> {
    state: Mutex<PoolState<R>>,
    available: Notify,
}

impl<R> Shared<R> {
    fn lock(&self) -> MutexGuard<'_, PoolState<R>> {
        // State stays consistent across a panic; every update is a single step
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Give up one live slot and wake a waiter.
    fn forfeit_slot(&self) {
        {
            let mut state = self.lock();
            state.created = state.created.saturating_sub(1);
        }
        self.available.notify_one();
    }
}

/// Exclusive access to one pooled resource.
pub struct PooledResource<R> {
    resource: Option<R>,
    broken: bool,
    shared: Arc<Shared<R>>,
}

impl<R> PooledResource<R> {
    pub fn resource_mut(&mut self) -> &mut R {
        match self.resource.as_mut() {
            Some(resource) => resource,
            None => unreachable!("lease is consumed by release"),
        }
    }

    /// Skip reset on release and replace the resource instead.
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }
}

impl<R> Drop for PooledResource<R> {
    fn drop(&mut self) {
        if self.resource.take().is_some() {
            tracing::warn!("Render resource lease dropped without release");
            {
                let mut state = self.shared.lock();
                state.in_use = state.in_use.saturating_sub(1);
            }
            self.shared.forfeit_slot();
        }
    }
}

/// Reserved creation slot, returned to the pool unless committed.
struct SlotReservation<'a, R> {
    shared: &'a Shared<R>,
    committed: bool,
}

impl<R> SlotReservation<'_, R> {
    fn commit(mut self) {
        self.committed = true;
    }
}

impl<R> Drop for SlotReservation<'_, R> {
    fn drop(&mut self) {
        if !self.committed {
            self.shared.forfeit_slot();
        }
    }
}

pub struct ResourcePool<B: RenderBackend> {
    backend: B,
    capacity: usize,
    shared: Arc<Shared<B::Resource>>,
}

impl<B: RenderBackend> ResourcePool<B> {
    /// Create an empty pool. A capacity of zero is treated as one.
    pub fn new(backend: B, capacity: usize) -> Self {
        Self {
            backend,
            capacity: capacity.max(1),
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState {
                    idle: VecDeque::new(),
                    created: 0,
                    in_use: 0,
                    closed: false,
                }),
                available: Notify::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.shared.lock();
        PoolStats {
            capacity: self.capacity,
            created: state.created,
            idle: state.idle.len(),
            in_use: state.in_use,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Fill the pool up to capacity. Returns how many resources were created.
    ///
    /// Creation failures are logged and leave their slot free.
    pub async fn precreate(&self) -> usize {
        let missing = {
            let state = self.shared.lock();
            if state.closed {
                return 0;
            }
            self.capacity.saturating_sub(state.created)
        };

        let mut created = 0;
        for _ in 0..missing {
            let Some(reservation) = self.reserve_slot() else {
                break;
            };
            match self.backend.create_resource().await {
                Ok(resource) => {
                    reservation.commit();
                    if let Some(mut rejected) = self.enqueue(resource) {
                        rejected.close().await;
                        self.shared.forfeit_slot();
                        break;
                    }
                    created += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to pre-create render resource");
                }
            }
        }

        tracing::info!(created, capacity = self.capacity, "Resource pool pre-created");
        created
    }

    /// Lease a resource, waiting while all `capacity` are in use.
    pub async fn acquire(&self) -> Result<PooledResource<B::Resource>, PoolError> {
        loop {
            let notified = self.shared.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let reservation = {
                let mut state = self.shared.lock();
                if state.closed {
                    return Err(PoolError::Closed);
                }
                if let Some(resource) = state.idle.pop_front() {
                    state.in_use += 1;
                    return Ok(self.lease(resource));
                }
                if state.created < self.capacity {
                    state.created += 1;
                    Some(SlotReservation {
                        shared: &*self.shared,
                        committed: false,
                    })
                } else {
                    None
                }
            };

            if let Some(reservation) = reservation {
                let resource = self
                    .backend
                    .create_resource()
                    .await
                    .map_err(PoolError::Creation)?;
                reservation.commit();
                self.shared.lock().in_use += 1;
                tracing::debug!(stats = ?self.stats(), "Created render resource on demand");
                return Ok(self.lease(resource));
            }

            notified.await;
        }
    }

    /// Return a lease. Healthy resources are reset and reused; broken ones
    /// or ones whose reset fails are closed and replaced.
    pub async fn release(&self, mut lease: PooledResource<B::Resource>) -> ReleaseOutcome {
        let broken = lease.broken;
        let Some(mut resource) = lease.resource.take() else {
            return ReleaseOutcome::Dropped;
        };
        drop(lease);

        let closed = {
            let mut state = self.shared.lock();
            state.in_use = state.in_use.saturating_sub(1);
            state.closed
        };
        if closed {
            resource.close().await;
            self.shared.forfeit_slot();
            return ReleaseOutcome::Dropped;
        }

        let healthy = if broken {
            false
        } else {
            match resource.reset().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Render resource reset failed, replacing");
                    false
                }
            }
        };

        let outcome = if healthy {
            ReleaseOutcome::Reused
        } else {
            resource.close().await;
            match self.backend.create_resource().await {
                Ok(fresh) => {
                    resource = fresh;
                    ReleaseOutcome::Replaced
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to replace render resource");
                    self.shared.forfeit_slot();
                    return ReleaseOutcome::Dropped;
                }
            }
        };

        match self.enqueue(resource) {
            None => outcome,
            Some(mut rejected) => {
                rejected.close().await;
                self.shared.forfeit_slot();
                ReleaseOutcome::Dropped
            }
        }
    }

    /// Close the pool: waiters fail, idle resources are closed now and leased
    /// ones on release.
    pub async fn shutdown(&self) {
        let idle: Vec<_> = {
            let mut state = self.shared.lock();
            state.closed = true;
            let idle: Vec<_> = state.idle.drain(..).collect();
            state.created = state.created.saturating_sub(idle.len());
            idle
        };
        self.shared.available.notify_waiters();

        let closed = idle.len();
        for mut resource in idle {
            resource.close().await;
        }
        self.backend.shutdown().await;
        tracing::info!(closed, "Resource pool shut down");
    }

    fn lease(&self, resource: B::Resource) -> PooledResource<B::Resource> {
        PooledResource {
            resource: Some(resource),
            broken: false,
            shared: self.shared.clone(),
        }
    }

    fn reserve_slot(&self) -> Option<SlotReservation<'_, B::Resource>> {
        let mut state = self.shared.lock();
        if state.closed || state.created >= self.capacity {
            return None;
        }
        state.created += 1;
        Some(SlotReservation {
            shared: &*self.shared,
            committed: false,
        })
    }

    /// Put a resource on the idle queue, handing it back if the pool closed.
    fn enqueue(&self, resource: B::Resource) -> Option<B::Resource> {
        {
            let mut state = self.shared.lock();
            if state.closed {
                return Some(resource);
            }
            state.idle.push_back(resource);
        }
        self.shared.available.notify_one();
        None
    }
}
