//! The delivery pass run for one `publish`.
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::{
  context::Context,
  error::{DeliveryError, Errors, Outcome},
  options::PublishOptions,
  registry::Registry,
  topic::Topic,
};

/// Everything one delivery pass needs, moved into the scheduled future.
pub(crate) struct Delivery<A> {
  registry: Arc<Registry<A>>,
  topic: Arc<Topic<A>>,
  ctx: Context,
  args: A,
}

impl<A> Delivery<A> {
  pub(crate) fn new(registry: Arc<Registry<A>>, topic: Arc<Topic<A>>, ctx: Context, args: A) -> Self {
    Self { registry, topic, ctx, args }
  }

  /// Wait for the topic's token, invoke its subscribers in order, sweep, and
  /// report the outcome on the result channel if there is one.
  pub(crate) async fn run(self) {
    let PublishOptions { strict, result } = self.ctx.publish_options();

    let outcome = {
      let token = self.topic.token.acquire().await;
      let outcome = self.pass(strict);

      let (swept, drained) = self.topic.sweep(&token);
      if swept > 0 {
        trace!(topic = self.topic.name(), swept, "swept subscribers");
      }
      if drained && self.registry.remove_drained(&self.topic) {
        debug!(topic = self.topic.name(), "topic drained, removed");
      }
      outcome
    };
    self.registry.settle(&self.topic);

    if let Some(result) = result {
      if result.unbounded_send(outcome).is_err() {
        debug!(topic = self.topic.name(), "publish result receiver dropped");
      }
    }
  }

  /// One ordered pass over the subscribers present when it starts.
  ///
  /// Entries are never removed while the token is held by this pass, so the
  /// positions below `count` stay valid; entries appended meanwhile are not
  /// visited.
  fn pass(&self, strict: bool) -> Outcome {
    let count = self.topic.len();
    trace!(topic = self.topic.name(), subscribers = count, strict, "delivery pass");

    let mut errors = Errors::new();
    for index in 0..count {
      let Some(callback) = self.topic.claim(index) else { break };
      if let Err(err) = callback.call(&self.ctx, &self.args) {
        if let DeliveryError::Fault(msg) = &err {
          warn!(topic = self.topic.name(), callback = ?callback.id(), "callback panicked: {msg}");
        }
        if strict {
          trace!(topic = self.topic.name(), index, "strict pass stopped");
          return Err(err);
        }
        errors.push(err);
      }
    }
    errors.into_result()
  }
}
