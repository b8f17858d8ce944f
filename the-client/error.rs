use the_edit_rpc::{
  SessionId,
  TransportError,
};
use thiserror::Error;

use crate::ConfigError;

#[derive(Debug, Error)]
pub enum EditError {
  /// The remote call itself failed.
  #[error("{op} error: {source}")]
  Transport {
    op:     &'static str,
    #[source]
    source: TransportError,
  },

  /// The call went through but the service answered with the zero serial.
  #[error("{op} failed")]
  EditFailed { op: &'static str },

  #[error("search error: {source}")]
  SearchFailed {
    #[source]
    source: TransportError,
  },

  /// Pausing or resuming viewport notifications failed. A failed resume
  /// leaves the session's observers silenced.
  #[error("{op} of viewport notifications for session {session} failed: {source}")]
  NotificationGuard {
    op:      &'static str,
    session: SessionId,
    #[source]
    source:  TransportError,
  },

  /// An edit inside a composite failed and so did the resume issued to
  /// clean up after it.
  #[error("{op} failed ({error}) and resuming notifications also failed: {resume}")]
  ResumeAfterFailure {
    op:     &'static str,
    #[source]
    error:  Box<EditError>,
    resume: TransportError,
  },

  /// Inserts, overwrites and search patterns need at least one byte.
  #[error("{op} requires a non-empty payload")]
  EmptyPayload { op: &'static str },

  #[error(transparent)]
  Config(#[from] ConfigError),
}

impl EditError {
  pub(crate) fn transport(op: &'static str) -> impl FnOnce(TransportError) -> Self {
    move |source| Self::Transport { op, source }
  }

  /// Name of the operation that produced the error, if it has one.
  pub fn op(&self) -> Option<&'static str> {
    match self {
      Self::Transport { op, .. }
      | Self::EditFailed { op }
      | Self::NotificationGuard { op, .. }
      | Self::ResumeAfterFailure { op, .. }
      | Self::EmptyPayload { op } => Some(*op),
      Self::SearchFailed { .. } => Some("search"),
      Self::Config(_) => None,
    }
  }

  /// The transport failure underneath, if any.
  pub fn transport_error(&self) -> Option<&TransportError> {
    match self {
      Self::Transport { source, .. }
      | Self::SearchFailed { source }
      | Self::NotificationGuard { source, .. } => Some(source),
      Self::ResumeAfterFailure { resume, .. } => Some(resume),
      Self::EditFailed { .. } | Self::EmptyPayload { .. } | Self::Config(_) => None,
    }
  }
}

pub type Result<T> = std::result::Result<T, EditError>;
