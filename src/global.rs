//! A process-wide default bus with free-function access.
//!
//! The default bus is created on first use and delivers on the shared thread
//! pool. It is the only global state of the crate besides the callback id
//! counter; code that needs isolation (tests, libraries) should construct its
//! own [`EventBus`] instead.
use once_cell::sync::Lazy;

use crate::{
  bus::EventBus,
  callback::{Args, Callback, CallbackId},
  context::Context,
  error::BusError,
};

static DEFAULT_BUS: Lazy<EventBus> = Lazy::new(EventBus::new);

/// The default bus used by the free functions of this module.
#[inline]
pub fn default_bus() -> &'static EventBus { &DEFAULT_BUS }

/// [`EventBus::subscribe`] on the default bus.
pub fn subscribe(ctx: &Context, topic: &str, callback: Callback<Args>) -> CallbackId {
  DEFAULT_BUS.subscribe(ctx, topic, callback)
}

/// [`EventBus::publish`] on the default bus.
pub fn publish(ctx: &Context, topic: &str, args: Args) -> Result<(), BusError> {
  DEFAULT_BUS.publish(ctx, topic, args)
}

/// [`EventBus::unsubscribe`] on the default bus.
pub fn unsubscribe(topic: &str, callbacks: &[CallbackId]) { DEFAULT_BUS.unsubscribe(topic, callbacks) }

/// [`EventBus::unsubscribe_all`] on the default bus.
pub fn unsubscribe_all(topic: &str) { DEFAULT_BUS.unsubscribe_all(topic) }
