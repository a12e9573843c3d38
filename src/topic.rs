//! Per-topic state: the subscriber list and the locks that guard it.
//!
//! Two mechanisms cooperate on the list:
//!
//! - the **structural lock** (`subscribers`) gives mutual exclusion for every
//!   in-place edit and flag write. It is held only for single, short edits and
//!   never while a callback runs.
//! - the **delivery token** is held for a whole delivery pass. Whoever holds it
//!   may physically remove entries; everyone else may only flag them.
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  callback::{Callback, CallbackId},
  topic::subscribers::{Subscriber, Subscribers, Upsert},
};

pub(crate) mod subscribers;
pub(crate) mod token;

pub(crate) use token::{DeliveryToken, TokenGuard};

pub(crate) struct Topic<A> {
  name: Arc<str>,
  subscribers: Mutex<Subscribers<A>>,
  pub(crate) token: DeliveryToken,
}

impl<A> Topic<A> {
  /// A new topic around its first subscriber, with the token available.
  pub(crate) fn new(name: Arc<str>, first: Subscriber<A>) -> Self {
    Self {
      name,
      subscribers: Mutex::new(Subscribers::with(first)),
      token: DeliveryToken::default(),
    }
  }

  #[inline]
  pub(crate) fn name(&self) -> &str { &self.name }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.subscribers.lock().len() }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.subscribers.lock().is_empty() }

  #[inline]
  pub(crate) fn ids(&self) -> Vec<CallbackId> { self.subscribers.lock().ids() }

  #[inline]
  pub(crate) fn upsert(&self, subscriber: Subscriber<A>) -> Upsert {
    self.subscribers.lock().upsert(subscriber)
  }

  #[inline]
  pub(crate) fn claim(&self, index: usize) -> Option<Callback<A>> {
    self.subscribers.lock().claim(index)
  }

  /// Flag matching entries for the in-flight pass to sweep.
  #[inline]
  pub(crate) fn mark_removal(&self, ids: &[CallbackId]) -> usize {
    self.subscribers.lock().mark_removal(ids)
  }

  #[inline]
  pub(crate) fn has_pending_removal(&self) -> bool { self.subscribers.lock().has_pending_removal() }

  /// Physically remove matching entries, and any flagged ones. Requires the
  /// delivery token.
  /// Returns `(removed, now_empty)`.
  pub(crate) fn remove(&self, _token: &TokenGuard<'_>, ids: &[CallbackId]) -> (usize, bool) {
    let mut subscribers = self.subscribers.lock();
    let removed = subscribers.remove(ids);
    (removed, subscribers.is_empty())
  }

  /// Drop flagged entries. Requires the delivery token.
  /// Returns `(swept, now_empty)`.
  pub(crate) fn sweep(&self, _token: &TokenGuard<'_>) -> (usize, bool) {
    let mut subscribers = self.subscribers.lock();
    let swept = subscribers.sweep();
    (swept, subscribers.is_empty())
  }
}
