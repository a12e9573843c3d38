//! Error types surfaced by the bus.
//!
//! Synchronous callers only ever see [`BusError`]. Everything that goes wrong
//! while callbacks run is folded into a [`DeliveryError`] and reported through
//! the result channel of the publish call that triggered it.
use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Boxed error type returned by subscriber callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of one delivery pass, as sent on a publish result channel.
pub type Outcome = Result<(), DeliveryError>;

/// Errors returned synchronously by bus operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
  /// `publish` on a topic that has no subscribers.
  #[error("topic not found: {0}")]
  TopicNotFound(String),

  /// A scheduler could not be constructed.
  #[error("scheduler unavailable: {0}")]
  Scheduler(String),
}

/// A failure produced while delivering one publish.
#[derive(Debug, Error)]
pub enum DeliveryError {
  /// The callback returned an error.
  #[error("{0}")]
  Callback(BoxError),

  /// The callback panicked; holds the panic message.
  #[error("{0}")]
  Fault(String),

  /// Every failure of a non-strict pass, in subscription order.
  #[error("{0}")]
  Aggregate(Errors),
}

impl DeliveryError {
  /// True for errors converted from a callback panic.
  #[inline]
  pub fn is_fault(&self) -> bool { matches!(self, DeliveryError::Fault(_)) }

  /// The aggregated errors, if this is an aggregate.
  pub fn as_aggregate(&self) -> Option<&Errors> {
    match self {
      DeliveryError::Aggregate(errors) => Some(errors),
      _ => None,
    }
  }
}

/// Ordered collection of the errors raised during one delivery pass.
///
/// Renders as `[first,second,...]`. An empty collection is not an error:
/// [`Errors::into_result`] collapses it to `Ok(())`.
#[derive(Debug, Default)]
pub struct Errors(Vec<DeliveryError>);

impl Errors {
  #[inline]
  pub fn new() -> Self { Self::default() }

  #[inline]
  pub fn push(&mut self, err: DeliveryError) { self.0.push(err); }

  #[inline]
  pub fn len(&self) -> usize { self.0.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = &DeliveryError> { self.0.iter() }

  /// `Ok(())` when nothing failed, otherwise the aggregate itself.
  pub fn into_result(self) -> Outcome {
    if self.0.is_empty() { Ok(()) } else { Err(DeliveryError::Aggregate(self)) }
  }
}

impl Display for Errors {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str("[")?;
    for (idx, err) in self.0.iter().enumerate() {
      if idx > 0 {
        f.write_str(",")?;
      }
      Display::fmt(err, f)?;
    }
    f.write_str("]")
  }
}

impl std::error::Error for Errors {}

impl IntoIterator for Errors {
  type Item = DeliveryError;
  type IntoIter = std::vec::IntoIter<DeliveryError>;

  fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl FromIterator<DeliveryError> for Errors {
  fn from_iter<T: IntoIterator<Item = DeliveryError>>(iter: T) -> Self {
    Self(iter.into_iter().collect())
  }
}
