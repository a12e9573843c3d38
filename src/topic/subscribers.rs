use smallvec::SmallVec;

use crate::callback::{Callback, CallbackId};

/// One registered callback and its lifecycle flags.
pub(crate) struct Subscriber<A> {
  pub(crate) callback: Callback<A>,
  pub(crate) once: bool,
  /// Set when the entry must be dropped by the next sweep.
  pub(crate) pending_removal: bool,
}

impl<A> Subscriber<A> {
  pub(crate) fn new(callback: Callback<A>, once: bool) -> Self {
    Self { callback, once, pending_removal: false }
  }

  #[inline]
  fn id(&self) -> CallbackId { self.callback.id() }

  #[inline]
  fn matches(&self, ids: &[CallbackId]) -> bool { ids.is_empty() || ids.contains(&self.id()) }
}

/// What `Subscribers::upsert` did with the entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Upsert {
  /// The topic did not exist and was created around the entry.
  Created,
  Appended,
  /// An entry with the same identity was overwritten in place.
  Replaced,
}

/// Ordered subscriber list of one topic.
///
/// Order is subscription order and is also delivery order. All methods take
/// `&mut self`; the owning topic guards the list with its structural lock.
///
/// Positional access (`claim`) is only stable while no entry is physically
/// removed. Removal happens in two places only, `remove` and `sweep`, and both
/// run while the caller holds the topic's delivery token.
pub(crate) struct Subscribers<A> {
  items: SmallVec<[Subscriber<A>; 2]>,
}

impl<A> Default for Subscribers<A> {
  fn default() -> Self { Self { items: SmallVec::new() } }
}

impl<A> Subscribers<A> {
  pub(crate) fn with(subscriber: Subscriber<A>) -> Self {
    let mut list = Self::default();
    list.items.push(subscriber);
    list
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.items.is_empty() }

  pub(crate) fn ids(&self) -> Vec<CallbackId> { self.items.iter().map(Subscriber::id).collect() }

  /// Replace the entry with the same identity, keeping its position, or
  /// append a new one at the tail.
  pub(crate) fn upsert(&mut self, subscriber: Subscriber<A>) -> Upsert {
    match self
      .items
      .iter_mut()
      .find(|s| s.id() == subscriber.id())
    {
      Some(slot) => {
        *slot = subscriber;
        Upsert::Replaced
      }
      None => {
        self.items.push(subscriber);
        Upsert::Appended
      }
    }
  }

  /// Physically remove the entries matching `ids` (all entries when `ids`
  /// is empty) together with any entry already flagged for removal.
  /// Returns how many were removed.
  pub(crate) fn remove(&mut self, ids: &[CallbackId]) -> usize {
    let before = self.items.len();
    self.items.retain(|s| !s.pending_removal && !s.matches(ids));
    before - self.items.len()
  }

  /// Flag the entries matching `ids` (all when empty) for removal by the next
  /// sweep. The list length does not change. Returns how many were flagged.
  pub(crate) fn mark_removal(&mut self, ids: &[CallbackId]) -> usize {
    let mut marked = 0;
    for s in self.items.iter_mut().filter(|s| s.matches(ids)) {
      s.pending_removal = true;
      marked += 1;
    }
    marked
  }

  #[inline]
  pub(crate) fn has_pending_removal(&self) -> bool { self.items.iter().any(|s| s.pending_removal) }

  /// Drop every entry flagged for removal. Returns how many were dropped.
  pub(crate) fn sweep(&mut self) -> usize {
    let before = self.items.len();
    self.items.retain(|s| !s.pending_removal);
    before - self.items.len()
  }

  /// Prepare the entry at `index` for invocation.
  ///
  /// A once entry is flagged for removal before it runs, so it is swept
  /// whatever the outcome of the call.
  pub(crate) fn claim(&mut self, index: usize) -> Option<Callback<A>> {
    let subscriber = self.items.get_mut(index)?;
    if subscriber.once {
      subscriber.pending_removal = true;
    }
    Some(subscriber.callback.clone())
  }

  #[cfg(test)]
  fn flags(&self) -> Vec<(bool, bool)> {
    self
      .items
      .iter()
      .map(|s| (s.once, s.pending_removal))
      .collect()
  }
}
