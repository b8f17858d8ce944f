mod channel;
mod config;
mod error;
mod gateway;
pub mod protocol;

pub use channel::{
  ChannelGateway,
  Envelope,
};
pub use config::GatewayConfig;
pub use error::{
  Result,
  TransportError,
};
pub use gateway::EditGateway;
pub use protocol::{
  BYTE_PROFILE_LEN,
  ChangeDetails,
  ChangeKind,
  ChangeRequest,
  CountKind,
  ProfileRequest,
  RemoteError,
  Request,
  Response,
  SearchRequest,
  SessionId,
};
