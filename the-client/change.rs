use std::sync::Arc;

use the_edit_rpc::{
  ChangeDetails,
  ChangeRequest,
  CountKind,
  EditGateway,
  SessionId,
};
use tokio::sync::OwnedMutexGuard;
use tracing::{
  debug,
  error,
  trace,
};

use crate::{
  ClientConfig,
  EditError,
  NotificationGuard,
  Payload,
  Result,
  Serial,
  SessionLocks,
};

/// Issues edits against remote sessions.
///
/// Every primitive is a single remote call. A zero serial from the service
/// becomes [`EditError::EditFailed`]; nothing is retried.
#[derive(Clone)]
pub struct ChangeCoordinator {
  gateway: Arc<dyn EditGateway>,
  guard:   NotificationGuard,
  locks:   Option<SessionLocks>,
}

impl ChangeCoordinator {
  pub fn new(gateway: Arc<dyn EditGateway>, config: &ClientConfig) -> Self {
    Self {
      guard: NotificationGuard::new(Arc::clone(&gateway)),
      locks: config.serialize_composites.then(SessionLocks::new),
      gateway,
    }
  }

  pub fn gateway(&self) -> &Arc<dyn EditGateway> {
    &self.gateway
  }

  pub fn guard(&self) -> &NotificationGuard {
    &self.guard
  }

  /// Serializes composites on `session` when the client is configured to.
  pub(crate) async fn lock(&self, session: &SessionId) -> Option<OwnedMutexGuard<()>> {
    match &self.locks {
      Some(locks) => Some(locks.lock(session).await),
      None => None,
    }
  }

  async fn submit(&self, op: &'static str, change: ChangeRequest) -> Result<Serial> {
    trace!(
      session = %change.session,
      op,
      offset = change.offset,
      "submitting change"
    );
    let raw = self
      .gateway
      .submit_change(change)
      .await
      .map_err(EditError::transport(op))?;
    Serial::from_raw(raw).ok_or(EditError::EditFailed { op })
  }

  pub async fn delete(&self, session: &SessionId, offset: u64, length: u64) -> Result<Serial> {
    self
      .submit(
        "delete",
        ChangeRequest::delete(session.clone(), offset, length),
      )
      .await
  }

  /// Inserts `data` at `offset`. The payload length is sent as is; an empty
  /// payload is rejected before anything reaches the service.
  pub async fn insert(
    &self,
    session: &SessionId,
    offset: u64,
    data: impl Into<Payload>,
  ) -> Result<Serial> {
    self.insert_payload(session, offset, &data.into()).await
  }

  async fn insert_payload(&self, session: &SessionId, offset: u64, data: &Payload) -> Result<Serial> {
    if data.is_empty() {
      return Err(EditError::EmptyPayload { op: "insert" });
    }
    self
      .submit(
        "insert",
        ChangeRequest::insert(session.clone(), offset, data.as_bytes().to_vec()),
      )
      .await
  }

  pub async fn overwrite(
    &self,
    session: &SessionId,
    offset: u64,
    data: impl Into<Payload>,
  ) -> Result<Serial> {
    let data = data.into();
    if data.is_empty() {
      return Err(EditError::EmptyPayload { op: "overwrite" });
    }
    self
      .submit(
        "overwrite",
        ChangeRequest::overwrite(session.clone(), offset, data.into_vec()),
      )
      .await
  }

  /// Undoes the last change; the serial is negative.
  pub async fn undo(&self, session: &SessionId) -> Result<Serial> {
    let raw = self
      .gateway
      .undo_last_change(session)
      .await
      .map_err(EditError::transport("undo"))?;
    Serial::from_raw(raw).ok_or(EditError::EditFailed { op: "undo" })
  }

  pub async fn redo(&self, session: &SessionId) -> Result<Serial> {
    let raw = self
      .gateway
      .redo_last_undo(session)
      .await
      .map_err(EditError::transport("redo"))?;
    Serial::from_raw(raw).ok_or(EditError::EditFailed { op: "redo" })
  }

  /// Discards every change of the session.
  pub async fn clear(&self, session: &SessionId) -> Result<SessionId> {
    self
      .gateway
      .clear_changes(session)
      .await
      .map_err(EditError::transport("clear"))
  }

  /// Replaces `remove_count` bytes at `offset` with `replacement`.
  ///
  /// Runs as pause, delete, resume, insert: observers see the removal and
  /// the insertion as a single change. Notifications are resumed before the
  /// insert, so the insert itself is what observers are notified of. The
  /// returned serial is the insert's.
  ///
  /// If the delete fails the insert is skipped, notifications are still
  /// resumed, and the delete's error is returned. With `remove_count == 0`
  /// this is a plain insert; with an empty `replacement` it is a delete under
  /// the pause and the delete's serial is returned.
  pub async fn replace(
    &self,
    session: &SessionId,
    offset: u64,
    remove_count: u64,
    replacement: impl Into<Payload>,
  ) -> Result<Serial> {
    let _lock = self.lock(session).await;
    self
      .replace_unlocked(session, offset, remove_count, &replacement.into())
      .await
  }

  pub(crate) async fn replace_unlocked(
    &self,
    session: &SessionId,
    offset: u64,
    remove_count: u64,
    replacement: &Payload,
  ) -> Result<Serial> {
    if remove_count == 0 {
      return self.insert_payload(session, offset, replacement).await;
    }

    let paused = self.guard.pause(session).await?;
    let deleted = self.delete(session, offset, remove_count).await;
    let resumed = paused.resume().await;

    let deleted = match (deleted, resumed) {
      (Ok(serial), Ok(())) => serial,
      (Err(err), Ok(())) | (Ok(_), Err(err)) => return Err(err),
      (Err(err), Err(resume_err)) => {
        error!(
          session = %session,
          offset,
          error = %err,
          "resume after failed delete also failed"
        );
        let resume = match resume_err {
          EditError::NotificationGuard { source, .. } => source,
          other => return Err(other),
        };
        return Err(EditError::ResumeAfterFailure {
          op: "replace",
          error: Box::new(err),
          resume,
        });
      },
    };
    debug!(session = %session, offset, remove_count, serial = %deleted, "replace removed bytes");

    if replacement.is_empty() {
      return Ok(deleted);
    }
    self.insert_payload(session, offset, replacement).await
  }

  pub async fn change_count(&self, session: &SessionId) -> Result<u64> {
    self
      .gateway
      .get_count(session, CountKind::Changes)
      .await
      .map_err(EditError::transport("change_count"))
  }

  pub async fn undo_count(&self, session: &SessionId) -> Result<u64> {
    self
      .gateway
      .get_count(session, CountKind::Undos)
      .await
      .map_err(EditError::transport("undo_count"))
  }

  pub async fn last_change(&self, session: &SessionId) -> Result<ChangeDetails> {
    self
      .gateway
      .get_last_change(session)
      .await
      .map_err(EditError::transport("last_change"))
  }

  pub async fn last_undo(&self, session: &SessionId) -> Result<ChangeDetails> {
    self
      .gateway
      .get_last_undo(session)
      .await
      .map_err(EditError::transport("last_undo"))
  }
}

#[cfg(test)]
mod tests {
  use the_edit_test::{
    Fault,
    MemoryGateway,
  };

  use super::*;

  fn setup(content: &str) -> (Arc<MemoryGateway>, ChangeCoordinator, SessionId) {
    let gateway = Arc::new(MemoryGateway::with_session("s", content));
    let changes = ChangeCoordinator::new(gateway.clone(), &ClientConfig::default());
    (gateway, changes, SessionId::new("s"))
  }

  #[tokio::test(flavor = "current_thread")]
  async fn replace_pauses_only_around_the_delete() {
    let (gateway, changes, session) = setup("hello world");
    let serial = changes.replace(&session, 6, 5, "there").await.unwrap();

    assert_eq!(serial.get(), 2);
    assert_eq!(gateway.content(&session), b"hello there");
    assert_eq!(
      gateway.methods(),
      vec!["pause", "delete", "resume", "insert"]
    );
    // The delete happened while paused, only the insert reached observers.
    assert_eq!(gateway.notifications(&session), vec![2]);
    assert!(!gateway.is_paused(&session));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn failed_delete_still_resumes_once() {
    let (gateway, changes, session) = setup("abc");
    gateway.fail_next("delete", Fault::Transport);

    let err = changes.replace(&session, 0, 1, "z").await.unwrap_err();
    assert!(matches!(err, EditError::Transport { op: "delete", .. }));
    assert_eq!(gateway.methods(), vec!["pause", "delete", "resume"]);
    assert_eq!(gateway.count_calls("resume"), 1);
    assert_eq!(gateway.count_calls("insert"), 0);
    assert!(!gateway.is_paused(&session));
    assert_eq!(gateway.content(&session), b"abc");
  }

  #[tokio::test(flavor = "current_thread")]
  async fn zero_serial_delete_is_edit_failed_and_resumes() {
    let (gateway, changes, session) = setup("abc");
    gateway.fail_next("delete", Fault::ZeroSerial);

    let err = changes.replace(&session, 0, 1, "z").await.unwrap_err();
    assert!(matches!(err, EditError::EditFailed { op: "delete" }));
    assert_eq!(gateway.count_calls("resume"), 1);
    assert!(!gateway.is_paused(&session));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn failed_pause_touches_nothing() {
    let (gateway, changes, session) = setup("abc");
    gateway.fail_next("pause", Fault::Transport);

    let err = changes.replace(&session, 0, 1, "z").await.unwrap_err();
    assert!(matches!(
      err,
      EditError::NotificationGuard { op: "pause", .. }
    ));
    assert_eq!(gateway.methods(), vec!["pause"]);
  }

  #[tokio::test(flavor = "current_thread")]
  async fn failed_resume_skips_the_insert() {
    let (gateway, changes, session) = setup("abc");
    gateway.fail_next("resume", Fault::Transport);

    let err = changes.replace(&session, 0, 1, "z").await.unwrap_err();
    assert!(matches!(
      err,
      EditError::NotificationGuard { op: "resume", .. }
    ));
    assert_eq!(gateway.count_calls("insert"), 0);
    assert_eq!(gateway.content(&session), b"bc");
  }

  #[tokio::test(flavor = "current_thread")]
  async fn both_delete_and_resume_failing_reports_both() {
    let (gateway, changes, session) = setup("abc");
    gateway.fail_next("delete", Fault::Transport);
    gateway.fail_next("resume", Fault::Transport);

    let err = changes.replace(&session, 0, 1, "z").await.unwrap_err();
    let EditError::ResumeAfterFailure { op, error, resume } = err else {
      panic!("expected ResumeAfterFailure, got {err:?}");
    };
    assert_eq!(op, "replace");
    assert!(matches!(*error, EditError::Transport { op: "delete", .. }));
    assert!(resume.to_string().contains("injected resume failure"));
  }

  #[tokio::test(flavor = "current_thread")]
  async fn zero_length_removal_is_a_plain_insert() {
    let (gateway, changes, session) = setup("ac");
    changes.replace(&session, 1, 0, "b").await.unwrap();
    assert_eq!(gateway.methods(), vec!["insert"]);
    assert_eq!(gateway.content(&session), b"abc");
  }

  #[tokio::test(flavor = "current_thread")]
  async fn empty_replacement_returns_the_delete_serial() {
    let (gateway, changes, session) = setup("abc");
    let serial = changes.replace(&session, 1, 1, "").await.unwrap();
    assert_eq!(serial.get(), 1);
    assert_eq!(gateway.methods(), vec!["pause", "delete", "resume"]);
    assert_eq!(gateway.content(&session), b"ac");
  }

  #[tokio::test(flavor = "current_thread")]
  async fn empty_insert_never_reaches_the_service() {
    let (gateway, changes, session) = setup("abc");
    let err = changes.insert(&session, 0, "").await.unwrap_err();
    assert!(matches!(err, EditError::EmptyPayload { op: "insert" }));
    let err = changes.overwrite(&session, 0, Vec::new()).await.unwrap_err();
    assert!(matches!(err, EditError::EmptyPayload { op: "overwrite" }));
    assert!(gateway.methods().is_empty());
  }
}
