use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::Mutex;
use the_edit_rpc::{
  ChangeDetails,
  ChangeKind,
  BYTE_PROFILE_LEN,
  ChangeRequest,
  CountKind,
  EditGateway,
  ProfileRequest,
  Result,
  SearchRequest,
  SessionId,
  TransportError,
};

const NO_SUCH_SESSION: i64 = 404;
const BAD_REQUEST: i64 = 400;
const INJECTED: i64 = 500;

/// How an injected failure shows up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
  /// The call itself errors.
  Transport,
  /// The call succeeds with the zero serial. Only meaningful for edits.
  ZeroSerial,
}

/// One entry of the call journal. `session` is `None` for service-wide
/// queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
  pub method:  &'static str,
  pub session: Option<SessionId>,
  pub offset:  Option<u64>,
}

#[derive(Debug, Clone)]
struct AppliedChange {
  serial:   i64,
  kind:     ChangeKind,
  offset:   u64,
  removed:  Vec<u8>,
  inserted: Vec<u8>,
}

impl AppliedChange {
  fn details(&self, session: &SessionId, serial: i64) -> ChangeDetails {
    let (length, data) = match self.kind {
      ChangeKind::Delete => (self.removed.len() as u64, Vec::new()),
      ChangeKind::Insert | ChangeKind::Overwrite => {
        (self.inserted.len() as u64, self.inserted.clone())
      },
    };
    ChangeDetails {
      session: session.clone(),
      serial,
      kind: self.kind,
      offset: self.offset,
      length,
      data,
    }
  }

  fn apply(&self, data: &mut Vec<u8>) {
    let start = self.offset as usize;
    data.splice(start..start + self.removed.len(), self.inserted.iter().copied());
  }

  fn revert(&self, data: &mut Vec<u8>) {
    let start = self.offset as usize;
    data.splice(start..start + self.inserted.len(), self.removed.iter().copied());
  }
}

#[derive(Debug, Default)]
struct MemorySession {
  original:      Vec<u8>,
  data:          Vec<u8>,
  changes:       Vec<AppliedChange>,
  undone:        Vec<AppliedChange>,
  next_serial:   i64,
  paused:        bool,
  /// Serials delivered to viewport observers, in order.
  notifications: Vec<i64>,
}

impl MemorySession {
  fn new(content: Vec<u8>) -> Self {
    Self {
      original: content.clone(),
      data: content,
      next_serial: 1,
      ..Self::default()
    }
  }

  fn notify(&mut self, serial: i64) {
    if !self.paused {
      self.notifications.push(serial);
    }
  }

  /// Returns the zero serial when the edit cannot be applied.
  fn submit(&mut self, change: ChangeRequest) -> i64 {
    let size = self.data.len() as u64;
    let offset = change.offset;
    if offset > size {
      return 0;
    }
    let start = offset as usize;
    let (removed, inserted) = match change.kind {
      ChangeKind::Delete => {
        let length = change.length.unwrap_or(0).min(size - offset);
        if length == 0 {
          return 0;
        }
        (self.data[start..start + length as usize].to_vec(), Vec::new())
      },
      ChangeKind::Insert => {
        let data = change.data.unwrap_or_default();
        if data.is_empty() {
          return 0;
        }
        (Vec::new(), data)
      },
      ChangeKind::Overwrite => {
        let data = change.data.unwrap_or_default();
        if data.is_empty() {
          return 0;
        }
        let length = (data.len() as u64).min(size - offset) as usize;
        (self.data[start..start + length].to_vec(), data)
      },
    };

    let serial = self.next_serial;
    self.next_serial += 1;
    let applied = AppliedChange {
      serial,
      kind: change.kind,
      offset,
      removed,
      inserted,
    };
    applied.apply(&mut self.data);
    self.changes.push(applied);
    self.undone.clear();
    self.notify(serial);
    serial
  }

  fn undo(&mut self) -> i64 {
    let Some(change) = self.changes.pop() else {
      return 0;
    };
    change.revert(&mut self.data);
    let serial = -change.serial;
    self.undone.push(change);
    self.notify(serial);
    serial
  }

  fn redo(&mut self) -> i64 {
    let Some(change) = self.undone.pop() else {
      return 0;
    };
    change.apply(&mut self.data);
    let serial = change.serial;
    self.changes.push(change);
    self.notify(serial);
    serial
  }

  fn clear(&mut self) {
    self.data = self.original.clone();
    self.changes.clear();
    self.undone.clear();
  }

  fn search(&self, search: &SearchRequest) -> Vec<u64> {
    let size = self.data.len();
    let start = (search.offset.unwrap_or(0) as usize).min(size);
    let end = match search.length {
      Some(length) if length > 0 => start.saturating_add(length as usize).min(size),
      _ => size,
    };
    let limit = search.limit.filter(|&limit| limit > 0).unwrap_or(u64::MAX);
    let pattern = &search.pattern;

    let matches_at = |at: usize| {
      let window = &self.data[at..at + pattern.len()];
      if search.case_insensitive {
        window.eq_ignore_ascii_case(pattern)
      } else {
        window == pattern.as_slice()
      }
    };

    let mut offsets = Vec::new();
    let mut at = start;
    while at + pattern.len() <= end && (offsets.len() as u64) < limit {
      if matches_at(at) {
        offsets.push(at as u64);
        at += pattern.len();
      } else {
        at += 1;
      }
    }
    offsets
  }

  fn profile(&self, profile: &ProfileRequest) -> Vec<u64> {
    let size = self.data.len();
    let start = (profile.offset.unwrap_or(0) as usize).min(size);
    let end = match profile.length {
      Some(length) if length > 0 => start.saturating_add(length as usize).min(size),
      _ => size,
    };
    let mut frequencies = vec![0; BYTE_PROFILE_LEN];
    for &byte in &self.data[start..end] {
      frequencies[usize::from(byte)] += 1;
    }
    frequencies
  }
}

#[derive(Debug, Default)]
struct State {
  sessions: HashMap<SessionId, MemorySession>,
  journal:  Vec<GatewayCall>,
  faults:   Vec<(&'static str, Fault)>,
}

impl State {
  fn record(&mut self, method: &'static str, session: Option<&SessionId>, offset: Option<u64>) {
    self.journal.push(GatewayCall {
      method,
      session: session.cloned(),
      offset,
    });
  }

  fn take_fault(&mut self, method: &'static str) -> Option<Fault> {
    let index = self.faults.iter().position(|(name, _)| *name == method)?;
    Some(self.faults.remove(index).1)
  }

  fn session(&mut self, session: &SessionId) -> Result<&mut MemorySession> {
    self
      .sessions
      .get_mut(session)
      .ok_or_else(|| TransportError::Remote {
        code:    NO_SUCH_SESSION,
        message: format!("no such session: {session}"),
      })
  }
}

fn injected(method: &'static str) -> TransportError {
  TransportError::Remote {
    code:    INJECTED,
    message: format!("injected {method} failure"),
  }
}

/// In-memory stand-in for the remote edit service.
///
/// Every call yields to the scheduler once before touching state so that
/// concurrent callers interleave the way they would over a real channel.
/// Search reports non-overlapping matches in ascending order.
#[derive(Debug, Default)]
pub struct MemoryGateway {
  state: Mutex<State>,
}

impl MemoryGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_session(session: impl Into<SessionId>, content: impl AsRef<[u8]>) -> Self {
    let gateway = Self::new();
    gateway.create_session(session, content);
    gateway
  }

  pub fn create_session(&self, session: impl Into<SessionId>, content: impl AsRef<[u8]>) {
    self.state.lock().sessions.insert(
      session.into(),
      MemorySession::new(content.as_ref().to_vec()),
    );
  }

  /// Current bytes of a session. Panics on an unknown session.
  pub fn content(&self, session: &SessionId) -> Vec<u8> {
    self.state.lock().sessions[session].data.clone()
  }

  pub fn is_paused(&self, session: &SessionId) -> bool {
    self.state.lock().sessions[session].paused
  }

  /// Serials that reached viewport observers, i.e. edits applied while the
  /// session was not paused.
  pub fn notifications(&self, session: &SessionId) -> Vec<i64> {
    self.state.lock().sessions[session].notifications.clone()
  }

  /// Make the next call to `method` fail. Edits are keyed by their kind
  /// (`"insert"`, `"delete"`, `"overwrite"`), everything else by the short
  /// names used in the journal.
  pub fn fail_next(&self, method: &'static str, fault: Fault) {
    self.state.lock().faults.push((method, fault));
  }

  pub fn calls(&self) -> Vec<GatewayCall> {
    self.state.lock().journal.clone()
  }

  pub fn methods(&self) -> Vec<&'static str> {
    self
      .state
      .lock()
      .journal
      .iter()
      .map(|call| call.method)
      .collect()
  }

  pub fn count_calls(&self, method: &str) -> usize {
    self
      .state
      .lock()
      .journal
      .iter()
      .filter(|call| call.method == method)
      .count()
  }

  /// Journal the call, check the session exists and apply any pending
  /// fault. `Ok(true)` means the call must answer with the zero serial.
  fn enter(&self, method: &'static str, session: &SessionId, offset: Option<u64>) -> Result<bool> {
    let mut state = self.state.lock();
    state.record(method, Some(session), offset);
    state.session(session)?;
    match state.take_fault(method) {
      Some(Fault::Transport) => Err(injected(method)),
      Some(Fault::ZeroSerial) => Ok(true),
      None => Ok(false),
    }
  }

  async fn begin(
    &self,
    method: &'static str,
    session: &SessionId,
    offset: Option<u64>,
  ) -> Result<bool> {
    tokio::task::yield_now().await;
    self.enter(method, session, offset)
  }
}

#[async_trait]
impl EditGateway for MemoryGateway {
  async fn submit_change(&self, change: ChangeRequest) -> Result<i64> {
    if self
      .begin(change.kind.as_str(), &change.session, Some(change.offset))
      .await?
    {
      return Ok(0);
    }
    let mut state = self.state.lock();
    let session = change.session.clone();
    Ok(state.session(&session)?.submit(change))
  }

  async fn undo_last_change(&self, session: &SessionId) -> Result<i64> {
    if self.begin("undo", session, None).await? {
      return Ok(0);
    }
    Ok(self.state.lock().session(session)?.undo())
  }

  async fn redo_last_undo(&self, session: &SessionId) -> Result<i64> {
    if self.begin("redo", session, None).await? {
      return Ok(0);
    }
    Ok(self.state.lock().session(session)?.redo())
  }

  async fn clear_changes(&self, session: &SessionId) -> Result<SessionId> {
    self.begin("clear", session, None).await?;
    self.state.lock().session(session)?.clear();
    Ok(session.clone())
  }

  async fn pause_session_changes(&self, session: &SessionId) -> Result<SessionId> {
    self.begin("pause", session, None).await?;
    self.state.lock().session(session)?.paused = true;
    Ok(session.clone())
  }

  async fn resume_session_changes(&self, session: &SessionId) -> Result<SessionId> {
    self.begin("resume", session, None).await?;
    self.state.lock().session(session)?.paused = false;
    Ok(session.clone())
  }

  async fn search_session(&self, search: SearchRequest) -> Result<Vec<u64>> {
    self.begin("search", &search.session, search.offset).await?;
    if search.pattern.is_empty() {
      return Err(TransportError::Remote {
        code:    BAD_REQUEST,
        message: "empty search pattern".into(),
      });
    }
    let mut state = self.state.lock();
    Ok(state.session(&search.session)?.search(&search))
  }

  async fn get_count(&self, session: &SessionId, kind: CountKind) -> Result<u64> {
    self.begin("count", session, None).await?;
    let mut state = self.state.lock();
    let session = state.session(session)?;
    let count = match kind {
      CountKind::Changes => session.changes.len(),
      CountKind::Undos => session.undone.len(),
    };
    Ok(count as u64)
  }

  async fn get_last_change(&self, session: &SessionId) -> Result<ChangeDetails> {
    self.begin("last_change", session, None).await?;
    let mut state = self.state.lock();
    let last = state
      .session(session)?
      .changes
      .last()
      .map(|change| change.details(session, change.serial));
    last.ok_or_else(|| TransportError::Remote {
      code:    NO_SUCH_SESSION,
      message: format!("session {session} has no changes"),
    })
  }

  async fn get_last_undo(&self, session: &SessionId) -> Result<ChangeDetails> {
    self.begin("last_undo", session, None).await?;
    let mut state = self.state.lock();
    let last = state
      .session(session)?
      .undone
      .last()
      .map(|change| change.details(session, -change.serial));
    last.ok_or_else(|| TransportError::Remote {
      code:    NO_SUCH_SESSION,
      message: format!("session {session} has no undone changes"),
    })
  }

  async fn get_segment(&self, session: &SessionId, offset: u64, length: u64) -> Result<Vec<u8>> {
    self.begin("segment", session, Some(offset)).await?;
    let mut state = self.state.lock();
    let data = &state.session(session)?.data;
    let start = (offset as usize).min(data.len());
    let end = start.saturating_add(length as usize).min(data.len());
    Ok(data[start..end].to_vec())
  }

  async fn get_computed_file_size(&self, session: &SessionId) -> Result<u64> {
    self.begin("size", session, None).await?;
    Ok(self.state.lock().session(session)?.data.len() as u64)
  }

  async fn profile_session(&self, profile: ProfileRequest) -> Result<Vec<u64>> {
    self.begin("profile", &profile.session, profile.offset).await?;
    let mut state = self.state.lock();
    Ok(state.session(&profile.session)?.profile(&profile))
  }

  async fn get_session_count(&self) -> Result<u64> {
    tokio::task::yield_now().await;
    let mut state = self.state.lock();
    state.record("session_count", None, None);
    if state.take_fault("session_count").is_some() {
      return Err(injected("session_count"));
    }
    Ok(state.sessions.len() as u64)
  }
}
