//! Optional mutual exclusion around the open-and-merge step.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A shareable retrieval lock. Clones share the same underlying mutex;
/// [`RetrievalLock::none`] never blocks.
///
/// ```
/// # use cmip_esgf::RetrievalLock;
/// # #[tokio::main]
/// # async fn main() {
/// let lock = RetrievalLock::new();
/// let shared = lock.clone();
/// {
///     let _guard = lock.acquire().await;
///     assert!(shared.is_held());
/// }
/// assert!(!shared.is_held());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RetrievalLock(Option<Arc<Mutex<()>>>);

/// Held for as long as the lock is taken; dropping it releases the lock.
#[derive(Debug)]
pub struct LockGuard(Option<OwnedMutexGuard<()>>);

impl RetrievalLock {
    pub fn new() -> Self {
        Self(Some(Arc::new(Mutex::new(()))))
    }

    /// A lock that never blocks.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_noop(&self) -> bool {
        self.0.is_none()
    }

    /// Whether another holder currently has the lock.
    pub fn is_held(&self) -> bool {
        self.0.as_ref().is_some_and(|m| m.try_lock().is_err())
    }

    pub async fn acquire(&self) -> LockGuard {
        match &self.0 {
            Some(mutex) => LockGuard(Some(Arc::clone(mutex).lock_owned().await)),
            None => LockGuard(None),
        }
    }
}
