//! Per-call options for `subscribe` and `publish`.
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

use crate::error::Outcome;

/// Sending half of a publish result channel.
///
/// Exactly one [`Outcome`] is sent per publish that carries it. The same
/// sender may be shared by many publishes.
pub type ResultSender = UnboundedSender<Outcome>;

/// Receiving half of a publish result channel.
pub type ResultReceiver = UnboundedReceiver<Outcome>;

/// Create a result channel for [`PublishOptions::with_result`].
pub fn result_channel() -> (ResultSender, ResultReceiver) { unbounded() }

/// Options read once by `subscribe`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
  /// Fire at most once, then remove the subscription.
  pub once: bool,
}

impl SubscribeOptions {
  #[inline]
  pub fn with_once(mut self, once: bool) -> Self {
    self.once = once;
    self
  }
}

/// Options read once by the delivery pass of a `publish`.
#[derive(Clone, Debug, Default)]
pub struct PublishOptions {
  /// Stop the pass at the first failing callback.
  pub strict: bool,
  /// Where the pass reports its outcome. `None` means fire-and-forget.
  pub result: Option<ResultSender>,
}

impl PublishOptions {
  #[inline]
  pub fn with_strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  #[inline]
  pub fn with_result(mut self, result: ResultSender) -> Self {
    self.result = Some(result);
    self
  }
}
