//! Per-entity plan serialization
//!
//! Two plans must never race to mutate the same entity's external
//! state, while plans for different entities are always safe to run
//! concurrently. The registry hands out one async mutex per entity;
//! holders keep the guard for the whole plan (or composite) run.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use paystream_core::types::EntityId;

/// Registry of per-entity locks.
#[derive(Default)]
pub struct EntityLocks {
    inner: Mutex<HashMap<EntityId, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one entity, waiting if a plan for the
    /// same entity is already in flight.
    pub async fn acquire(&self, entity: &EntityId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(entity.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Try to acquire without waiting; `None` means a plan for this
    /// entity is already running.
    pub async fn try_acquire(&self, entity: &EntityId) -> Option<OwnedMutexGuard<()>> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(entity.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.try_lock_owned().ok()
    }
}
