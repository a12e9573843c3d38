//! Concurrent topic registry.
//!
//! Lock order is registry shard, then topic structural lock. Creation and
//! upsert run inside the shard entry; teardown re-checks emptiness inside
//! `remove_if`. A subscribe racing with the last removal therefore either
//! lands in the old topic before it is checked (and the topic survives) or
//! finds the name vacant and creates a fresh topic with a fresh token.
use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::{debug, trace};

use crate::topic::{subscribers::Subscriber, subscribers::Upsert, Topic};

pub(crate) struct Registry<A> {
  topics: DashMap<Arc<str>, Arc<Topic<A>>>,
}

impl<A> Default for Registry<A> {
  fn default() -> Self { Self { topics: DashMap::new() } }
}

impl<A> Registry<A> {
  /// Add or replace a subscriber, creating the topic on first use.
  pub(crate) fn upsert(&self, name: &str, subscriber: Subscriber<A>) -> Upsert {
    match self.topics.entry(Arc::from(name)) {
      Entry::Occupied(occupied) => occupied.get().upsert(subscriber),
      Entry::Vacant(vacant) => {
        let topic = Topic::new(vacant.key().clone(), subscriber);
        vacant.insert(Arc::new(topic));
        Upsert::Created
      }
    }
  }

  pub(crate) fn get(&self, name: &str) -> Option<Arc<Topic<A>>> {
    self.topics.get(name).map(|t| t.value().clone())
  }

  /// Remove `topic` if it is still the registered instance and still empty.
  pub(crate) fn remove_drained(&self, topic: &Arc<Topic<A>>) -> bool {
    self
      .topics
      .remove_if(topic.name(), |_, current| Arc::ptr_eq(current, topic) && current.is_empty())
      .is_some()
  }

  /// Sweep entries that were flagged while someone else held the token.
  ///
  /// Every token holder calls this right after releasing the token. A flag
  /// set while the token was taken is then either seen by the holder's
  /// check here, or was set after it, in which case the flagging caller's
  /// own `settle` finds the token free.
  pub(crate) fn settle(&self, topic: &Arc<Topic<A>>) {
    while topic.has_pending_removal() {
      let Some(token) = topic.token.try_acquire() else { return };
      let (swept, drained) = topic.sweep(&token);
      trace!(topic = topic.name(), swept, "settled flagged subscribers");
      if drained && self.remove_drained(topic) {
        debug!(topic = topic.name(), "topic drained, removed");
      }
    }
  }

  #[inline]
  pub(crate) fn contains(&self, name: &str) -> bool { self.topics.contains_key(name) }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.topics.len() }

  pub(crate) fn names(&self) -> Vec<String> {
    self
      .topics
      .iter()
      .map(|t| t.key().to_string())
      .collect()
  }
}
