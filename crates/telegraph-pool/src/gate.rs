//! Global admission gate for publish operations

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{Error, Result};
use crate::pool::AccountPool;

/// Capacity used when no usable pool is configured.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Caps the number of publish operations running at once.
///
/// Sized once at startup from the pool, so there are never more publishes in
/// flight than accounts to serve them. Cloning shares the same permits.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Gate with `capacity` permits (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// One permit per pool account, or `fallback` when the pool is missing
    /// or has no usable accounts.
    pub fn for_pool(pool: Option<&AccountPool>, fallback: usize) -> Self {
        let capacity = pool
            .filter(|p| p.valid())
            .map(AccountPool::count)
            .unwrap_or(fallback);
        Self::new(capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a permit, run `f`, release the permit.
    ///
    /// The permit is dropped on every exit path, including errors and a
    /// cancelled caller.
    pub async fn with_permit<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::GateClosed)?;
        f().await
    }
}
