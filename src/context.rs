//! Execution context passed alongside every bus call.
//!
//! A [`Context`] is an immutable, cheaply cloned value. It carries the
//! options of the call it is passed to and, optionally, one out-of-band data
//! value that callbacks can read during delivery. Builders consume the
//! context and return a new one, so a context can be derived from another
//! without affecting it.
//!
//! ```rust
//! use topicbus::prelude::*;
//!
//! let (tx, _rx) = result_channel();
//! let ctx = Context::background()
//!   .with_data(7_i8)
//!   .with_publish_options(PublishOptions::default().with_strict(true).with_result(tx));
//!
//! assert!(ctx.publish_options().strict);
//! assert_eq!(ctx.data::<i8>(), Some(&7));
//! ```
use std::{
  any::Any,
  fmt::{Debug, Formatter},
  sync::Arc,
};

use crate::options::{PublishOptions, SubscribeOptions};

#[derive(Clone, Default)]
pub struct Context {
  subscribe: Option<SubscribeOptions>,
  publish: Option<PublishOptions>,
  data: Option<Arc<dyn Any + Send + Sync>>,
}

impl Context {
  /// An empty context: default options, no data.
  #[inline]
  pub fn background() -> Self { Self::default() }

  pub fn with_subscribe_options(mut self, options: SubscribeOptions) -> Self {
    self.subscribe = Some(options);
    self
  }

  pub fn with_publish_options(mut self, options: PublishOptions) -> Self {
    self.publish = Some(options);
    self
  }

  /// Attach a data value, replacing any previous one.
  pub fn with_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
    self.data = Some(Arc::new(data));
    self
  }

  /// Attach an already shared data value.
  pub fn with_shared_data(mut self, data: Arc<dyn Any + Send + Sync>) -> Self {
    self.data = Some(data);
    self
  }

  /// Effective subscribe options; defaults when none were attached.
  #[inline]
  pub fn subscribe_options(&self) -> SubscribeOptions { self.subscribe.unwrap_or_default() }

  /// Effective publish options; defaults when none were attached.
  #[inline]
  pub fn publish_options(&self) -> PublishOptions { self.publish.clone().unwrap_or_default() }

  /// The attached data, if there is one of type `T`.
  pub fn data<T: Any>(&self) -> Option<&T> { self.data.as_deref()?.downcast_ref::<T>() }

  #[inline]
  pub fn has_data(&self) -> bool { self.data.is_some() }
}

impl Debug for Context {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Context")
      .field("subscribe", &self.subscribe)
      .field("publish", &self.publish)
      .field("has_data", &self.has_data())
      .finish()
  }
}
