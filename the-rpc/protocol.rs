//! Wire types exchanged with the remote edit service.
//!
//! Every gateway call is one [`Request`] answered by exactly one [`Response`]
//! or [`RemoteError`]. The types are plain serde structs so any transport can
//! carry them.

use std::fmt;

use serde::{
  Deserialize,
  Serialize,
};

/// Opaque handle to a session owned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for SessionId {
  fn from(id: &str) -> Self {
    Self::new(id)
  }
}

impl From<String> for SessionId {
  fn from(id: String) -> Self {
    Self(id)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
  Delete,
  Insert,
  Overwrite,
}

impl ChangeKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Delete => "delete",
      Self::Insert => "insert",
      Self::Overwrite => "overwrite",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountKind {
  Changes,
  Undos,
}

/// A single primitive edit. `length` is only sent for deletes, `data` only
/// for inserts and overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
  pub session: SessionId,
  pub kind:    ChangeKind,
  pub offset:  u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub length:  Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data:    Option<Vec<u8>>,
}

impl ChangeRequest {
  pub fn delete(session: SessionId, offset: u64, length: u64) -> Self {
    Self {
      session,
      kind: ChangeKind::Delete,
      offset,
      length: Some(length),
      data: None,
    }
  }

  pub fn insert(session: SessionId, offset: u64, data: Vec<u8>) -> Self {
    Self {
      session,
      kind: ChangeKind::Insert,
      offset,
      length: None,
      data: Some(data),
    }
  }

  pub fn overwrite(session: SessionId, offset: u64, data: Vec<u8>) -> Self {
    Self {
      session,
      kind: ChangeKind::Overwrite,
      offset,
      length: None,
      data: Some(data),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
  pub session:          SessionId,
  pub pattern:          Vec<u8>,
  #[serde(default)]
  pub case_insensitive: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub offset:           Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub length:           Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub limit:            Option<u64>,
}

/// Number of slots in a byte frequency profile, one per byte value.
pub const BYTE_PROFILE_LEN: usize = 256;

/// Byte frequency profile of a session, optionally bounded to a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRequest {
  pub session: SessionId,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub offset:  Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub length:  Option<u64>,
}

/// Details of the most recent change (or undone change) of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDetails {
  pub session: SessionId,
  pub serial:  i64,
  pub kind:    ChangeKind,
  pub offset:  u64,
  pub length:  u64,
  #[serde(default)]
  pub data:    Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Request {
  SubmitChange(ChangeRequest),
  UndoLastChange(SessionId),
  RedoLastUndo(SessionId),
  ClearChanges(SessionId),
  PauseSessionChanges(SessionId),
  ResumeSessionChanges(SessionId),
  SearchSession(SearchRequest),
  GetCount {
    session: SessionId,
    kind:    CountKind,
  },
  GetLastChange(SessionId),
  GetLastUndo(SessionId),
  GetSegment {
    session: SessionId,
    offset:  u64,
    length:  u64,
  },
  GetComputedFileSize(SessionId),
  ProfileSession(ProfileRequest),
  GetSessionCount,
}

impl Request {
  pub fn method(&self) -> &'static str {
    match self {
      Self::SubmitChange(_) => "submit_change",
      Self::UndoLastChange(_) => "undo_last_change",
      Self::RedoLastUndo(_) => "redo_last_undo",
      Self::ClearChanges(_) => "clear_changes",
      Self::PauseSessionChanges(_) => "pause_session_changes",
      Self::ResumeSessionChanges(_) => "resume_session_changes",
      Self::SearchSession(_) => "search_session",
      Self::GetCount { .. } => "get_count",
      Self::GetLastChange(_) => "get_last_change",
      Self::GetLastUndo(_) => "get_last_undo",
      Self::GetSegment { .. } => "get_segment",
      Self::GetComputedFileSize(_) => "get_computed_file_size",
      Self::ProfileSession(_) => "profile_session",
      Self::GetSessionCount => "get_session_count",
    }
  }

  /// The session a request targets, `None` for service-wide queries.
  pub fn session(&self) -> Option<&SessionId> {
    let session = match self {
      Self::SubmitChange(change) => &change.session,
      Self::SearchSession(search) => &search.session,
      Self::ProfileSession(profile) => &profile.session,
      Self::GetSessionCount => return None,
      Self::GetCount { session, .. } | Self::GetSegment { session, .. } => session,
      Self::UndoLastChange(session)
      | Self::RedoLastUndo(session)
      | Self::ClearChanges(session)
      | Self::PauseSessionChanges(session)
      | Self::ResumeSessionChanges(session)
      | Self::GetLastChange(session)
      | Self::GetLastUndo(session)
      | Self::GetComputedFileSize(session) => session,
    };
    Some(session)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Response {
  Serial(i64),
  Session(SessionId),
  MatchOffsets(Vec<u64>),
  Count(u64),
  Change(ChangeDetails),
  Segment(Vec<u8>),
  Size(u64),
  Profile(Vec<u64>),
}

impl Response {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Serial(_) => "serial",
      Self::Session(_) => "session",
      Self::MatchOffsets(_) => "match_offsets",
      Self::Count(_) => "count",
      Self::Change(_) => "change",
      Self::Segment(_) => "segment",
      Self::Size(_) => "size",
      Self::Profile(_) => "profile",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
  pub code:    i64,
  pub message: String,
}

impl RemoteError {
  pub fn new(code: i64, message: impl Into<String>) -> Self {
    Self {
      code,
      message: message.into(),
    }
  }
}
