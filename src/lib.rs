//! # topicbus: in-process named-topic publish/subscribe
//!
//! Register callbacks against topic names, publish a payload to a topic to
//! run all of its callbacks asynchronously, and remove callbacks one by one or
//! all at once.
//!
//! ## Quick Start
//!
//! ```rust
//! use futures::{executor::block_on, StreamExt};
//! use topicbus::prelude::*;
//!
//! let bus = EventBus::new();
//! let greet = Callback::new(|_ctx, args: &Args| match arg::<&str>(args, 0) {
//!   Some(name) => {
//!     println!("hello, {name}");
//!     Ok(())
//!   }
//!   None => Err("missing name".into()),
//! });
//! bus.subscribe(&Context::background(), "greet", greet);
//!
//! // fire-and-forget
//! bus.publish(&Context::background(), "greet", args!["world"]).unwrap();
//!
//! // or wait for the outcome of the pass
//! let (tx, mut rx) = result_channel();
//! let ctx = Context::background().with_publish_options(PublishOptions::default().with_result(tx));
//! bus.publish(&ctx, "greet", args![]).unwrap();
//! let outcome = block_on(rx.next()).unwrap();
//! assert_eq!(outcome.unwrap_err().to_string(), "[missing name]");
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EventBus`] | Topic registry plus `subscribe` / `publish` / `unsubscribe` |
//! | [`Callback`] | Subscriber function with a stable [`CallbackId`] |
//! | [`Context`] | Per-call options and an optional data value for callbacks |
//! | [`Scheduler`] | Where delivery passes run |
//!
//! ## Delivery semantics
//!
//! - Callbacks of one topic run in subscription order, one pass at a time.
//! - A failing or panicking callback never stops a lenient pass; its error is
//!   collected into an [`Errors`] aggregate. A strict pass stops at the first
//!   failure and reports only that error.
//! - A `once` subscription fires in exactly one pass and is then removed.
//! - A topic disappears when its last subscriber is removed; publishing to it
//!   then fails with [`BusError::TopicNotFound`].
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`**: [`TokioScheduler`](scheduler::TokioScheduler),
//!   running deliveries on a tokio runtime.
//!
//! [`Scheduler`]: scheduler::Scheduler
pub mod bus;
pub mod callback;
pub mod context;
mod delivery;
pub mod error;
pub mod global;
pub mod options;
pub mod prelude;
pub mod pubsub;
mod registry;
pub mod scheduler;
mod topic;

pub use global::{publish, subscribe, unsubscribe, unsubscribe_all};
// Re-export the prelude module
pub use prelude::*;
