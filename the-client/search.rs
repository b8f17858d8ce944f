use std::sync::Arc;

use the_edit_rpc::{
  EditGateway,
  SearchRequest,
  SessionId,
};
use tracing::{
  debug,
  warn,
};

use crate::{
  ChangeCoordinator,
  EditError,
  Payload,
  Result,
  Serial,
};

/// Pattern and range of a search.
///
/// Zero for `length` or `limit` means unbounded, the same as leaving them
/// unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
  pattern:          Payload,
  case_insensitive: bool,
  offset:           Option<u64>,
  length:           Option<u64>,
  limit:            Option<u64>,
}

impl SearchQuery {
  pub fn new(pattern: impl Into<Payload>) -> Self {
    Self {
      pattern:          pattern.into(),
      case_insensitive: false,
      offset:           None,
      length:           None,
      limit:            None,
    }
  }

  pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
    self.case_insensitive = case_insensitive;
    self
  }

  /// Start searching at `offset`.
  pub fn offset(mut self, offset: u64) -> Self {
    self.offset = Some(offset);
    self
  }

  /// Only search `length` bytes from the start offset.
  pub fn length(mut self, length: u64) -> Self {
    self.length = Some(length);
    self
  }

  /// Stop after `limit` matches.
  pub fn limit(mut self, limit: u64) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn pattern(&self) -> &Payload {
    &self.pattern
  }

  pub fn start(&self) -> u64 {
    self.offset.unwrap_or(0)
  }

  fn to_request(&self, session: &SessionId, limit: Option<u64>) -> SearchRequest {
    SearchRequest {
      session:          session.clone(),
      pattern:          self.pattern.as_bytes().to_vec(),
      case_insensitive: self.case_insensitive,
      offset:           self.offset,
      length:           self.length.filter(|&length| length > 0),
      limit:            limit.filter(|&limit| limit > 0),
    }
  }
}

/// Result of [`SearchReplace::replace_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOne {
  Replaced {
    match_offset: u64,
    /// Where a follow-up forward scan should start so it does not match
    /// inside the text just inserted.
    next_offset:  u64,
    serial:       Serial,
  },
  NotFound,
}

impl ReplaceOne {
  pub fn is_replaced(&self) -> bool {
    matches!(self, Self::Replaced { .. })
  }

  pub fn next_offset(&self) -> Option<u64> {
    match self {
      Self::Replaced { next_offset, .. } => Some(*next_offset),
      Self::NotFound => None,
    }
  }

  /// `(true, next_offset)` after a replacement, `(false, -1)` otherwise.
  pub fn as_pair(&self) -> (bool, i64) {
    match self.next_offset() {
      Some(next) => (true, i64::try_from(next).unwrap_or(i64::MAX)),
      None => (false, -1),
    }
  }
}

/// Finds pattern matches in a session and rewrites them.
#[derive(Clone)]
pub struct SearchReplace {
  gateway: Arc<dyn EditGateway>,
  changes: ChangeCoordinator,
}

impl SearchReplace {
  pub fn new(changes: ChangeCoordinator) -> Self {
    Self {
      gateway: Arc::clone(changes.gateway()),
      changes,
    }
  }

  /// Offsets of the matches of `query`, ascending. Does not modify the
  /// session.
  pub async fn search(&self, session: &SessionId, query: &SearchQuery) -> Result<Vec<u64>> {
    self.search_limited(session, query, query.limit).await
  }

  async fn search_limited(
    &self,
    session: &SessionId,
    query: &SearchQuery,
    limit: Option<u64>,
  ) -> Result<Vec<u64>> {
    if query.pattern.is_empty() {
      return Err(EditError::EmptyPayload { op: "search" });
    }
    let matches = self
      .gateway
      .search_session(query.to_request(session, limit))
      .await
      .map_err(|source| EditError::SearchFailed { source })?;
    debug!(session = %session, matches = matches.len(), "search finished");
    Ok(matches)
  }

  /// Replaces every match of `query` with `replacement` and returns how
  /// many were replaced.
  ///
  /// Matches are rewritten from the highest offset down. An edit only moves
  /// bytes after its own offset, so every match still pending sits below the
  /// edit and keeps its offset, whatever the length of the replacement.
  pub async fn replace_all(
    &self,
    session: &SessionId,
    query: &SearchQuery,
    replacement: impl Into<Payload>,
  ) -> Result<usize> {
    let replacement = replacement.into();
    let _lock = self.changes.lock(session).await;

    let matches = self.search(session, query).await?;
    let remove_count = query.pattern.byte_len();
    for (done, &offset) in matches.iter().rev().enumerate() {
      if let Err(err) = self
        .changes
        .replace_unlocked(session, offset, remove_count, &replacement)
        .await
      {
        warn!(
          session = %session,
          offset,
          replaced = done,
          total = matches.len(),
          "replace all stopped early"
        );
        return Err(err);
      }
    }
    Ok(matches.len())
  }

  /// Replaces the first match of `query` at or after its start offset.
  pub async fn replace_one(
    &self,
    session: &SessionId,
    query: &SearchQuery,
    replacement: impl Into<Payload>,
  ) -> Result<ReplaceOne> {
    let replacement = replacement.into();
    let _lock = self.changes.lock(session).await;

    let matches = self.search_limited(session, query, Some(1)).await?;
    let Some(&match_offset) = matches.first() else {
      return Ok(ReplaceOne::NotFound);
    };
    let serial = self
      .changes
      .replace_unlocked(
        session,
        match_offset,
        query.pattern.byte_len(),
        &replacement,
      )
      .await?;
    Ok(ReplaceOne::Replaced {
      match_offset,
      next_offset: match_offset + replacement.byte_len(),
      serial,
    })
  }
}
