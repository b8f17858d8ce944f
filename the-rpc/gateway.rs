use async_trait::async_trait;

use crate::{
  Result,
  protocol::{
    ChangeDetails,
    ChangeRequest,
    CountKind,
    ProfileRequest,
    SearchRequest,
    SessionId,
  },
};

/// Request/response contract of the remote edit service.
///
/// Serials are returned raw: zero is the service's failure sentinel and it is
/// up to the caller to reject it.
#[async_trait]
pub trait EditGateway: Send + Sync {
  async fn submit_change(&self, change: ChangeRequest) -> Result<i64>;

  async fn undo_last_change(&self, session: &SessionId) -> Result<i64>;

  async fn redo_last_undo(&self, session: &SessionId) -> Result<i64>;

  async fn clear_changes(&self, session: &SessionId) -> Result<SessionId>;

  async fn pause_session_changes(&self, session: &SessionId) -> Result<SessionId>;

  async fn resume_session_changes(&self, session: &SessionId) -> Result<SessionId>;

  /// Match offsets are ascending.
  async fn search_session(&self, search: SearchRequest) -> Result<Vec<u64>>;

  async fn get_count(&self, session: &SessionId, kind: CountKind) -> Result<u64>;

  async fn get_last_change(&self, session: &SessionId) -> Result<ChangeDetails>;

  async fn get_last_undo(&self, session: &SessionId) -> Result<ChangeDetails>;

  async fn get_segment(&self, session: &SessionId, offset: u64, length: u64) -> Result<Vec<u8>>;

  async fn get_computed_file_size(&self, session: &SessionId) -> Result<u64>;

  /// One count per byte value, `BYTE_PROFILE_LEN` entries.
  async fn profile_session(&self, profile: ProfileRequest) -> Result<Vec<u64>>;

  /// Number of sessions open on the service.
  async fn get_session_count(&self) -> Result<u64>;
}
