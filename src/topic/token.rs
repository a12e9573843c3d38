use futures::lock::{Mutex, MutexGuard};

/// Binary semaphore serializing delivery passes on one topic.
///
/// Available means the topic is idle. A held token means a delivery pass is
/// in flight, which `try_acquire` reports without waiting.
#[derive(Default)]
pub(crate) struct DeliveryToken(Mutex<()>);

/// Proof that the token is held; dropping it makes the token available.
pub(crate) struct TokenGuard<'a>(#[allow(dead_code)] MutexGuard<'a, ()>);

impl DeliveryToken {
  /// Wait until the token is available and take it.
  pub(crate) async fn acquire(&self) -> TokenGuard<'_> { TokenGuard(self.0.lock().await) }

  /// Take the token if it is available, never waiting.
  #[inline]
  pub(crate) fn try_acquire(&self) -> Option<TokenGuard<'_>> { self.0.try_lock().map(TokenGuard) }

  #[cfg(test)]
  pub(crate) fn is_busy(&self) -> bool { self.try_acquire().is_none() }
}
