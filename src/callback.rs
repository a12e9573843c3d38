//! Subscriber callbacks and the loosely typed default payload.
//!
//! Closures carry no comparable identity, so every [`Callback`] is stamped
//! with a [`CallbackId`] when it is created. Clones of a handle share the id;
//! two handles built from the same closure do not. Subscribing a clone of an
//! already registered handle replaces the existing entry, and
//! `unsubscribe` matches by id.
use std::{
  any::Any,
  fmt::{Debug, Formatter},
  panic::{catch_unwind, AssertUnwindSafe},
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
};

use crate::{
  context::Context,
  error::{BoxError, DeliveryError},
};

/// One loosely typed argument.
pub type Arg = Box<dyn Any + Send + Sync>;

/// The default payload: an ordered sequence of loosely typed arguments.
pub type Args = Vec<Arg>;

/// Build an [`Args`] payload from a list of values.
///
/// ```rust
/// use topicbus::{arg, args};
///
/// let payload = args![1_u32, "two"];
/// assert_eq!(arg::<u32>(&payload, 0), Some(&1));
/// assert_eq!(arg::<&str>(&payload, 1), Some(&"two"));
/// ```
#[macro_export]
macro_rules! args {
  () => {
    ::std::vec::Vec::<$crate::Arg>::new()
  };
  ($($value:expr),+ $(,)?) => {
    ::std::vec![$(::std::boxed::Box::new($value) as $crate::Arg),+]
  };
}

/// Read the argument at `index` as a `T`.
pub fn arg<T: Any>(args: &[Arg], index: usize) -> Option<&T> {
  args.get(index).and_then(|value| (**value).downcast_ref::<T>())
}

/// Identity of a [`Callback`], shared by all of its clones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(usize);

impl CallbackId {
  fn next() -> Self {
    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
    Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
  }
}

impl<A> From<&Callback<A>> for CallbackId {
  #[inline]
  fn from(callback: &Callback<A>) -> Self { callback.id }
}

type CallbackFn<A> = dyn Fn(&Context, &A) -> Result<(), BoxError> + Send + Sync;

/// A shareable subscriber callback with a stable identity.
pub struct Callback<A = Args> {
  id: CallbackId,
  f: Arc<CallbackFn<A>>,
}

impl<A> Callback<A> {
  pub fn new<F>(f: F) -> Self
  where
    F: Fn(&Context, &A) -> Result<(), BoxError> + Send + Sync + 'static,
  {
    Self { id: CallbackId::next(), f: Arc::new(f) }
  }

  #[inline]
  pub fn id(&self) -> CallbackId { self.id }

  /// Invoke the callback, converting a panic into [`DeliveryError::Fault`].
  pub(crate) fn call(&self, ctx: &Context, args: &A) -> Result<(), DeliveryError> {
    match catch_unwind(AssertUnwindSafe(|| (self.f)(ctx, args))) {
      Ok(Ok(())) => Ok(()),
      Ok(Err(err)) => Err(DeliveryError::Callback(err)),
      Err(payload) => Err(DeliveryError::Fault(panic_message(payload))),
    }
  }
}

impl<A> Clone for Callback<A> {
  #[inline]
  fn clone(&self) -> Self { Self { id: self.id, f: self.f.clone() } }
}

impl<A> Debug for Callback<A> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Callback").field("id", &self.id).finish()
  }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  let payload = match payload.downcast::<BoxError>() {
    Ok(err) => return err.to_string(),
    Err(payload) => payload,
  };
  let payload = match payload.downcast::<String>() {
    Ok(msg) => return *msg,
    Err(payload) => payload,
  };
  match payload.downcast::<&'static str>() {
    Ok(msg) => (*msg).to_owned(),
    Err(_) => "callback panicked".to_owned(),
  }
}
