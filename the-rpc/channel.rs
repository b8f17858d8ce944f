use std::{
  sync::{
    Arc,
    atomic::{
      AtomicU64,
      Ordering,
    },
  },
  time::Duration,
};

use async_trait::async_trait;
use tokio::sync::{
  mpsc,
  oneshot,
};
use tracing::trace;

use crate::{
  EditGateway,
  GatewayConfig,
  Result,
  TransportError,
  protocol::{
    ChangeDetails,
    ChangeRequest,
    CountKind,
    ProfileRequest,
    RemoteError,
    Request,
    Response,
    SearchRequest,
    SessionId,
  },
};

/// A request in flight, handed to whoever serves the gateway.
///
/// The envelope must be answered through [`Envelope::respond`]; dropping it
/// resolves the caller with [`TransportError::Cancelled`].
#[derive(Debug)]
pub struct Envelope {
  pub id:      u64,
  pub request: Request,
  reply:       oneshot::Sender<std::result::Result<Response, RemoteError>>,
}

impl Envelope {
  /// Returns false if the caller stopped waiting for the reply.
  pub fn respond(self, response: std::result::Result<Response, RemoteError>) -> bool {
    self.reply.send(response).is_ok()
  }
}

/// [`EditGateway`] over a bounded tokio channel.
///
/// Each call enqueues one [`Envelope`] and waits on its oneshot reply, so it
/// resolves exactly once no matter how the serving side behaves.
#[derive(Debug, Clone)]
pub struct ChannelGateway {
  outbound_tx:     mpsc::Sender<Envelope>,
  next_id:         Arc<AtomicU64>,
  request_timeout: Option<Duration>,
}

impl ChannelGateway {
  pub fn new(config: &GatewayConfig) -> (Self, mpsc::Receiver<Envelope>) {
    let (outbound_tx, outbound_rx) = mpsc::channel(config.channel_capacity.max(1));
    let gateway = Self {
      outbound_tx,
      next_id: Arc::new(AtomicU64::new(1)),
      request_timeout: config.request_timeout(),
    };
    (gateway, outbound_rx)
  }

  pub async fn call(&self, request: Request) -> Result<Response> {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let method = request.method();
    let (reply_tx, reply_rx) = oneshot::channel();
    let envelope = Envelope {
      id,
      request,
      reply: reply_tx,
    };

    let exchange = async {
      self
        .outbound_tx
        .send(envelope)
        .await
        .map_err(|_| TransportError::Closed)?;
      trace!(id, method, "gateway request dispatched");
      reply_rx.await.map_err(|_| TransportError::Cancelled)
    };

    let reply = match self.request_timeout {
      Some(timeout) => tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| TransportError::TimedOut(timeout))??,
      None => exchange.await?,
    };

    trace!(id, method, ok = reply.is_ok(), "gateway request completed");
    Ok(reply?)
  }
}

fn unexpected(expected: &'static str, actual: &Response) -> TransportError {
  TransportError::UnexpectedResponse {
    expected,
    actual: actual.kind(),
  }
}

fn into_serial(response: Response) -> Result<i64> {
  match response {
    Response::Serial(serial) => Ok(serial),
    other => Err(unexpected("serial", &other)),
  }
}

fn into_session(response: Response) -> Result<SessionId> {
  match response {
    Response::Session(session) => Ok(session),
    other => Err(unexpected("session", &other)),
  }
}

fn into_count(response: Response) -> Result<u64> {
  match response {
    Response::Count(count) => Ok(count),
    other => Err(unexpected("count", &other)),
  }
}

fn into_change(response: Response) -> Result<ChangeDetails> {
  match response {
    Response::Change(details) => Ok(details),
    other => Err(unexpected("change", &other)),
  }
}

#[async_trait]
impl EditGateway for ChannelGateway {
  async fn submit_change(&self, change: ChangeRequest) -> Result<i64> {
    into_serial(self.call(Request::SubmitChange(change)).await?)
  }

  async fn undo_last_change(&self, session: &SessionId) -> Result<i64> {
    into_serial(self.call(Request::UndoLastChange(session.clone())).await?)
  }

  async fn redo_last_undo(&self, session: &SessionId) -> Result<i64> {
    into_serial(self.call(Request::RedoLastUndo(session.clone())).await?)
  }

  async fn clear_changes(&self, session: &SessionId) -> Result<SessionId> {
    into_session(self.call(Request::ClearChanges(session.clone())).await?)
  }

  async fn pause_session_changes(&self, session: &SessionId) -> Result<SessionId> {
    into_session(
      self
        .call(Request::PauseSessionChanges(session.clone()))
        .await?,
    )
  }

  async fn resume_session_changes(&self, session: &SessionId) -> Result<SessionId> {
    into_session(
      self
        .call(Request::ResumeSessionChanges(session.clone()))
        .await?,
    )
  }

  async fn search_session(&self, search: SearchRequest) -> Result<Vec<u64>> {
    match self.call(Request::SearchSession(search)).await? {
      Response::MatchOffsets(offsets) => Ok(offsets),
      other => Err(unexpected("match_offsets", &other)),
    }
  }

  async fn get_count(&self, session: &SessionId, kind: CountKind) -> Result<u64> {
    into_count(
      self
        .call(Request::GetCount {
          session: session.clone(),
          kind,
        })
        .await?,
    )
  }

  async fn get_last_change(&self, session: &SessionId) -> Result<ChangeDetails> {
    into_change(self.call(Request::GetLastChange(session.clone())).await?)
  }

  async fn get_last_undo(&self, session: &SessionId) -> Result<ChangeDetails> {
    into_change(self.call(Request::GetLastUndo(session.clone())).await?)
  }

  async fn get_segment(&self, session: &SessionId, offset: u64, length: u64) -> Result<Vec<u8>> {
    let request = Request::GetSegment {
      session: session.clone(),
      offset,
      length,
    };
    match self.call(request).await? {
      Response::Segment(data) => Ok(data),
      other => Err(unexpected("segment", &other)),
    }
  }

  async fn get_computed_file_size(&self, session: &SessionId) -> Result<u64> {
    match self
      .call(Request::GetComputedFileSize(session.clone()))
      .await?
    {
      Response::Size(size) => Ok(size),
      other => Err(unexpected("size", &other)),
    }
  }

  async fn profile_session(&self, profile: ProfileRequest) -> Result<Vec<u64>> {
    match self.call(Request::ProfileSession(profile)).await? {
      Response::Profile(frequencies) => Ok(frequencies),
      other => Err(unexpected("profile", &other)),
    }
  }

  async fn get_session_count(&self) -> Result<u64> {
    into_count(self.call(Request::GetSessionCount).await?)
  }
}
