use std::{
  path::Path,
  sync::Arc,
};

use the_edit_rpc::{
  ChannelGateway,
  EditGateway,
  Envelope,
  ProfileRequest,
  SessionId,
};
use tokio::sync::mpsc;

use crate::{
  ChangeCoordinator,
  ClientConfig,
  EditError,
  NotificationGuard,
  Result,
  SearchReplace,
};

/// Everything a caller needs to edit remote sessions, built from one
/// explicit [`ClientConfig`].
#[derive(Clone)]
pub struct EditClient {
  config:  ClientConfig,
  changes: ChangeCoordinator,
  search:  SearchReplace,
}

impl EditClient {
  pub fn new(gateway: Arc<dyn EditGateway>, config: ClientConfig) -> Self {
    let changes = ChangeCoordinator::new(gateway, &config);
    let search = SearchReplace::new(changes.clone());
    Self {
      config,
      changes,
      search,
    }
  }

  /// Builds a client on a [`ChannelGateway`]. The returned receiver yields
  /// the requests the service has to answer.
  pub fn over_channel(config: ClientConfig) -> (Self, mpsc::Receiver<Envelope>) {
    let (gateway, requests) = ChannelGateway::new(&config.gateway);
    (Self::new(Arc::new(gateway), config), requests)
  }

  pub fn from_config_file(gateway: Arc<dyn EditGateway>, path: impl AsRef<Path>) -> Result<Self> {
    let config = ClientConfig::load(path)?;
    Ok(Self::new(gateway, config))
  }

  pub fn config(&self) -> &ClientConfig {
    &self.config
  }

  pub fn changes(&self) -> &ChangeCoordinator {
    &self.changes
  }

  pub fn search(&self) -> &SearchReplace {
    &self.search
  }

  pub fn guard(&self) -> &NotificationGuard {
    self.changes.guard()
  }

  pub async fn segment(&self, session: &SessionId, offset: u64, length: u64) -> Result<Vec<u8>> {
    self
      .changes
      .gateway()
      .get_segment(session, offset, length)
      .await
      .map_err(EditError::transport("segment"))
  }

  pub async fn computed_file_size(&self, session: &SessionId) -> Result<u64> {
    self
      .changes
      .gateway()
      .get_computed_file_size(session)
      .await
      .map_err(EditError::transport("computed_file_size"))
  }

  /// Byte frequency profile of `length` bytes from `offset`, one count per
  /// byte value. Zero for either bound means from the start and to the end.
  pub async fn profile(&self, session: &SessionId, offset: u64, length: u64) -> Result<Vec<u64>> {
    let profile = ProfileRequest {
      session: session.clone(),
      offset:  Some(offset).filter(|&offset| offset > 0),
      length:  Some(length).filter(|&length| length > 0),
    };
    self
      .changes
      .gateway()
      .profile_session(profile)
      .await
      .map_err(EditError::transport("profile"))
  }

  pub async fn session_count(&self) -> Result<u64> {
    self
      .changes
      .gateway()
      .get_session_count()
      .await
      .map_err(EditError::transport("session_count"))
  }
}
