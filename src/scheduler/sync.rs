use futures::{executor::block_on, future::BoxFuture};

use super::Scheduler;

/// Runs each delivery to completion on the publishing thread.
///
/// `publish` returns only after the pass has finished, which makes ordering
/// deterministic in tests and single-threaded tools. Delivery on this
/// scheduler is not asynchronous: a callback that publishes to its own topic
/// waits on a token its own pass holds and never returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
  #[inline]
  fn spawn(&self, task: BoxFuture<'static, ()>) { block_on(task) }
}
