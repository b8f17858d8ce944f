use std::sync::Arc;

use the_edit_rpc::{
  EditGateway,
  SessionId,
};
use tracing::{
  debug,
  error,
  warn,
};

use crate::{
  EditError,
  Result,
};

/// Pauses and resumes change notifications for a session's viewports.
///
/// The paused flag lives on the service and is shared by every observer of
/// the session, so each successful [`pause`](Self::pause) must be matched by
/// exactly one resume. [`PausedSession`] carries that obligation.
#[derive(Clone)]
pub struct NotificationGuard {
  gateway: Arc<dyn EditGateway>,
}

impl NotificationGuard {
  pub fn new(gateway: Arc<dyn EditGateway>) -> Self {
    Self { gateway }
  }

  pub async fn pause(&self, session: &SessionId) -> Result<PausedSession> {
    self
      .gateway
      .pause_session_changes(session)
      .await
      .map_err(|source| {
        EditError::NotificationGuard {
          op: "pause",
          session: session.clone(),
          source,
        }
      })?;
    debug!(session = %session, "viewport notifications paused");
    Ok(PausedSession {
      gateway: Some(Arc::clone(&self.gateway)),
      session: session.clone(),
    })
  }
}

/// A session whose notifications are paused.
///
/// Call [`resume`](Self::resume) to release it. If the token is dropped
/// instead, for example because the future driving a composite edit was
/// abandoned, the resume is sent from a background task on the current tokio
/// runtime.
#[must_use = "dropping a PausedSession resumes notifications in the background"]
pub struct PausedSession {
  gateway: Option<Arc<dyn EditGateway>>,
  session: SessionId,
}

impl PausedSession {
  pub fn session(&self) -> &SessionId {
    &self.session
  }

  pub async fn resume(mut self) -> Result<()> {
    let Some(gateway) = self.gateway.clone() else {
      return Ok(());
    };
    // the handle stays in the token until the call settles, a drop while it
    // is in flight still resumes from the background
    let resumed = gateway.resume_session_changes(&self.session).await;
    self.gateway = None;
    resumed.map_err(|source| {
      EditError::NotificationGuard {
        op: "resume",
        session: self.session.clone(),
        source,
      }
    })?;
    debug!(session = %self.session, "viewport notifications resumed");
    Ok(())
  }
}

impl Drop for PausedSession {
  fn drop(&mut self) {
    let Some(gateway) = self.gateway.take() else {
      return;
    };
    let session = self.session.clone();
    warn!(session = %session, "paused session dropped without resume");

    // only spawn if we are inside a runtime, there is nobody to drive the
    // call otherwise
    if tokio::runtime::Handle::try_current().is_err() {
      error!(session = %session, "no runtime to resume notifications on, session stays paused");
      return;
    }
    tokio::spawn(async move {
      if let Err(err) = gateway.resume_session_changes(&session).await {
        error!(session = %session, error = %err, "background resume failed");
      }
    });
  }
}
