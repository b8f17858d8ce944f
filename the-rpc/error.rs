use std::time::Duration;

use thiserror::Error;

use crate::protocol::RemoteError;

/// Failure of the remote call itself, as opposed to a call that completed
/// and reported a failed edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
  #[error("gateway channel is closed")]
  Closed,
  #[error("gateway dropped the request without replying")]
  Cancelled,
  #[error("gateway request timed out after {0:?}")]
  TimedOut(Duration),
  #[error("gateway error {code}: {message}")]
  Remote { code: i64, message: String },
  #[error("expected a {expected} response, got {actual}")]
  UnexpectedResponse {
    expected: &'static str,
    actual:   &'static str,
  },
}

impl From<RemoteError> for TransportError {
  fn from(err: RemoteError) -> Self {
    Self::Remote {
      code:    err.code,
      message: err.message,
    }
  }
}

pub type Result<T> = std::result::Result<T, TransportError>;
