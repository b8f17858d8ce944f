use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use the_edit_rpc::SessionId;
use tokio::sync::{
  Mutex as AsyncMutex,
  OwnedMutexGuard,
};

/// One async lock per session, handed out on demand.
///
/// Holding the guard across a composite keeps other composites on the same
/// session from interleaving their remote calls with it. Sessions nobody
/// holds or waits on are dropped from the table the next time a lock is
/// taken.
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
  locks: Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>>,
}

impl SessionLocks {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn lock(&self, session: &SessionId) -> OwnedMutexGuard<()> {
    let lock = {
      let mut locks = self.locks.lock();
      locks.retain(|_, lock| Arc::strong_count(lock) > 1);
      Arc::clone(locks.entry(session.clone()).or_default())
    };
    lock.lock_owned().await
  }

  /// Number of sessions currently tracked.
  pub fn len(&self) -> usize {
    self.locks.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
