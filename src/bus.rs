//! The publish/subscribe bus.
//!
//! # Concurrency
//!
//! - `subscribe` and `unsubscribe` run synchronously on the caller's thread and
//!   never wait on a delivery.
//! - `publish` only looks the topic up; the delivery pass is handed to the
//!   bus's [`Scheduler`] and the call returns at once.
//! - Passes on the same topic are serialized by the topic's delivery token, in
//!   the order they acquire it. Passes on different topics run in parallel.
//!
//! # Unsubscribing during a delivery
//!
//! `unsubscribe` probes the delivery token without waiting:
//!
//! - idle topic: matching entries are removed at once, and the topic itself
//!   is dropped when it becomes empty.
//! - delivery in flight: matching entries are only flagged. The in-flight pass
//!   removes them when it finishes (they still fire in that pass if it had
//!   not reached them yet). The list never shrinks under a running pass.
//!
//! Another `unsubscribe` also holds the token for a moment. Flags left while
//! any caller held it are swept by whoever next finds the token free, so a
//! topic whose callbacks were all unsubscribed is always torn down.
use std::sync::Arc;

use tracing::debug;

use crate::{
  callback::{Args, Callback, CallbackId},
  context::Context,
  delivery::Delivery,
  error::BusError,
  registry::Registry,
  scheduler::{Scheduler, ThreadPoolScheduler},
  topic::subscribers::Subscriber,
};

/// In-process named-topic publish/subscribe bus.
///
/// `A` is the payload type handed to every callback of this bus; the default
/// [`Args`] is a loosely typed argument list. `S` decides where delivery
/// passes run.
///
/// Cloning a bus yields another handle to the same topics.
///
/// ```rust
/// use std::sync::{
///   atomic::{AtomicUsize, Ordering},
///   Arc,
/// };
///
/// use futures::{executor::block_on, StreamExt};
/// use topicbus::prelude::*;
///
/// let bus = EventBus::new();
/// let hits = Arc::new(AtomicUsize::new(0));
/// let c_hits = hits.clone();
/// let cb = Callback::new(move |_, args: &Args| {
///   c_hits.fetch_add(*arg::<usize>(args, 0).unwrap_or(&0), Ordering::SeqCst);
///   Ok(())
/// });
/// bus.subscribe(&Context::background(), "orders", cb.clone());
///
/// let (tx, mut rx) = result_channel();
/// let ctx = Context::background().with_publish_options(PublishOptions::default().with_result(tx));
/// bus.publish(&ctx, "orders", args![2_usize]).unwrap();
///
/// assert!(block_on(rx.next()).unwrap().is_ok());
/// assert_eq!(hits.load(Ordering::SeqCst), 2);
///
/// bus.unsubscribe("orders", &[cb.id()]);
/// assert!(bus.publish(&ctx, "orders", args![]).is_err());
/// ```
pub struct EventBus<A = Args, S = ThreadPoolScheduler> {
  registry: Arc<Registry<A>>,
  scheduler: S,
}

impl<A> EventBus<A, ThreadPoolScheduler> {
  /// A bus delivering on the shared default thread pool.
  pub fn new() -> Self { Self::with_scheduler(ThreadPoolScheduler::default()) }
}

impl<A> Default for EventBus<A, ThreadPoolScheduler> {
  fn default() -> Self { Self::new() }
}

impl<A, S: Clone> Clone for EventBus<A, S> {
  fn clone(&self) -> Self { Self { registry: self.registry.clone(), scheduler: self.scheduler.clone() } }
}

impl<A, S> EventBus<A, S> {
  pub fn with_scheduler(scheduler: S) -> Self { Self { registry: Arc::default(), scheduler } }

  #[inline]
  pub fn scheduler(&self) -> &S { &self.scheduler }

  #[inline]
  pub fn contains_topic(&self, topic: &str) -> bool { self.registry.contains(topic) }

  #[inline]
  pub fn topic_count(&self) -> usize { self.registry.len() }

  /// Names of the topics that currently have subscribers.
  pub fn topics(&self) -> Vec<String> { self.registry.names() }

  /// Length of the topic's subscriber list, including entries flagged for
  /// removal by an in-flight delivery.
  pub fn subscriber_count(&self, topic: &str) -> Option<usize> {
    self.registry.get(topic).map(|t| t.len())
  }

  /// Subscriber ids in delivery order.
  pub fn subscriber_ids(&self, topic: &str) -> Option<Vec<CallbackId>> {
    self.registry.get(topic).map(|t| t.ids())
  }

  /// Register `callback` on `topic`.
  ///
  /// Reads `once` from the context's subscribe options. Subscribing a handle
  /// whose id is already registered replaces that entry in place with the
  /// new options; otherwise the callback is appended and fires after every
  /// earlier subscriber.
  pub fn subscribe(&self, ctx: &Context, topic: &str, callback: Callback<A>) -> CallbackId {
    let once = ctx.subscribe_options().once;
    let id = callback.id();
    let upsert = self.registry.upsert(topic, Subscriber::new(callback, once));
    debug!(topic, callback = ?id, once, ?upsert, "subscribed");
    id
  }

  /// Remove the given callbacks from `topic`; every callback when `callbacks`
  /// is empty. Unknown topics and ids are ignored.
  pub fn unsubscribe(&self, topic: &str, callbacks: &[CallbackId]) {
    let Some(entry) = self.registry.get(topic) else { return };

    let token = entry.token.try_acquire();
    match token {
      Some(token) => {
        let (removed, drained) = entry.remove(&token, callbacks);
        debug!(topic, removed, "unsubscribed");
        if drained && self.registry.remove_drained(&entry) {
          debug!(topic, "topic drained, removed");
        }
      }
      None => {
        let marked = entry.mark_removal(callbacks);
        debug!(topic, marked, "token busy, unsubscribe deferred");
      }
    }
    self.registry.settle(&entry);
  }

  #[inline]
  pub fn unsubscribe_all(&self, topic: &str) { self.unsubscribe(topic, &[]) }
}

impl<A, S> EventBus<A, S>
where
  A: Send + Sync + 'static,
  S: Scheduler,
{
  /// Deliver `args` to every subscriber of `topic`.
  ///
  /// Returns [`BusError::TopicNotFound`] when the topic has no subscribers.
  /// Otherwise the pass is scheduled and `Ok(())` is returned immediately;
  /// its outcome is sent on the context's result channel, if one is set.
  pub fn publish(&self, ctx: &Context, topic: &str, args: A) -> Result<(), BusError> {
    let entry = self
      .registry
      .get(topic)
      .ok_or_else(|| BusError::TopicNotFound(topic.to_owned()))?;

    let delivery = Delivery::new(self.registry.clone(), entry, ctx.clone(), args);
    self.scheduler.spawn(Box::pin(delivery.run()));
    Ok(())
  }
}
