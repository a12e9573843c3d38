pub use crate::{
  args,
  bus::EventBus,
  callback::{arg, Arg, Args, Callback, CallbackId},
  context::Context,
  error::{BoxError, BusError, DeliveryError, Errors, Outcome},
  global::default_bus,
  options::{result_channel, PublishOptions, ResultReceiver, ResultSender, SubscribeOptions},
  pubsub::PubSub,
  scheduler::{InlineScheduler, Scheduler, ThreadPoolScheduler},
};
