use futures::future::BoxFuture;
use tokio::runtime::Handle;

use super::Scheduler;
use crate::error::BusError;

/// Runs deliveries as detached tasks on a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  /// Use the runtime the caller is running on.
  pub fn current() -> Result<Self, BusError> {
    let handle = Handle::try_current().map_err(|e| BusError::Scheduler(e.to_string()))?;
    Ok(Self { handle })
  }

  pub fn from_handle(handle: Handle) -> Self { Self { handle } }
}

impl Scheduler for TokioScheduler {
  #[inline]
  fn spawn(&self, task: BoxFuture<'static, ()>) {
    // detached: completion is reported through the publish result channel
    let _ = self.handle.spawn(task);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[topicbus_macro::test]
  fn current_fails_outside_runtime() {
    assert!(matches!(TokioScheduler::current(), Err(BusError::Scheduler(_))));
  }

  #[topicbus_macro::test(shared)]
  async fn spawn_runs_on_runtime() {
    let scheduler = TokioScheduler::current().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel();
    scheduler.spawn(Box::pin(async move {
      let _ = tx.send(42);
    }));
    assert_eq!(rx.await.unwrap(), 42);
  }
}
