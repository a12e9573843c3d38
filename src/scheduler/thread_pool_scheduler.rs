use futures::{executor::ThreadPool, future::BoxFuture};
use once_cell::sync::Lazy;

use super::Scheduler;
use crate::error::BusError;

static DEFAULT_POOL: Lazy<ThreadPool> = Lazy::new(|| {
  ThreadPool::builder()
    .name_prefix("topicbus-")
    .create()
    .expect("failed to create the default delivery thread pool")
});

/// Runs deliveries on a `futures` thread pool.
///
/// `Default` shares one lazily created process-wide pool; use [`new`] or
/// [`with_pool`] to give a bus its own.
///
/// [`new`]: ThreadPoolScheduler::new
/// [`with_pool`]: ThreadPoolScheduler::with_pool
#[derive(Clone, Debug)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl ThreadPoolScheduler {
  /// A scheduler with a dedicated pool of `size` threads.
  pub fn new(size: usize) -> Result<Self, BusError> {
    if size == 0 {
      return Err(BusError::Scheduler("thread pool size must be positive".into()));
    }
    let pool = ThreadPool::builder()
      .pool_size(size)
      .name_prefix("topicbus-")
      .create()
      .map_err(|e| BusError::Scheduler(e.to_string()))?;
    Ok(Self { pool })
  }

  pub fn with_pool(pool: ThreadPool) -> Self { Self { pool } }
}

impl Default for ThreadPoolScheduler {
  fn default() -> Self { Self { pool: DEFAULT_POOL.clone() } }
}

impl Scheduler for ThreadPoolScheduler {
  #[inline]
  fn spawn(&self, task: BoxFuture<'static, ()>) { self.pool.spawn_ok(task); }
}
