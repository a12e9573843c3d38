//! Where delivery passes run.
//!
//! `publish` never runs callbacks itself. It wraps the delivery pass in a
//! future and hands it to the bus's [`Scheduler`], then returns. The only
//! suspension point inside that future is waiting for the topic's delivery
//! token, so a scheduler backed by a real executor lets passes for different
//! topics proceed in parallel while passes for the same topic queue up.
use futures::future::BoxFuture;

mod sync;
mod thread_pool_scheduler;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use sync::InlineScheduler;
pub use thread_pool_scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// Runs delivery futures independently of the publishing caller.
pub trait Scheduler: Send + Sync + 'static {
  /// Start `task`. Must not wait for it to finish, except where the
  /// implementation documents otherwise.
  fn spawn(&self, task: BoxFuture<'static, ()>);
}

impl<S: Scheduler + ?Sized> Scheduler for std::sync::Arc<S> {
  #[inline]
  fn spawn(&self, task: BoxFuture<'static, ()>) { (**self).spawn(task) }
}
