use crate::{
  bus::EventBus,
  callback::{Callback, CallbackId},
  context::Context,
  error::BusError,
  scheduler::Scheduler,
};

/// The publish/subscribe contract, for code that should not depend on a
/// concrete bus or scheduler.
pub trait PubSub<A> {
  fn subscribe(&self, ctx: &Context, topic: &str, callback: Callback<A>) -> CallbackId;

  fn publish(&self, ctx: &Context, topic: &str, args: A) -> Result<(), BusError>;

  /// Remove `callbacks` from `topic`; all of them when the slice is empty.
  fn unsubscribe(&self, topic: &str, callbacks: &[CallbackId]);
}

impl<A, S> PubSub<A> for EventBus<A, S>
where
  A: Send + Sync + 'static,
  S: Scheduler,
{
  #[inline]
  fn subscribe(&self, ctx: &Context, topic: &str, callback: Callback<A>) -> CallbackId {
    EventBus::subscribe(self, ctx, topic, callback)
  }

  #[inline]
  fn publish(&self, ctx: &Context, topic: &str, args: A) -> Result<(), BusError> {
    EventBus::publish(self, ctx, topic, args)
  }

  #[inline]
  fn unsubscribe(&self, topic: &str, callbacks: &[CallbackId]) {
    EventBus::unsubscribe(self, topic, callbacks)
  }
}
