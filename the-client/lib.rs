//! Client-side coordination of edits against a remote byte-editing service.
//!
//! The service owns the bytes, the change log and pattern search. This crate
//! sequences its primitive calls into composite edits: [`ChangeCoordinator`]
//! issues edits and builds `replace` out of delete + insert,
//! [`NotificationGuard`] keeps viewport observers quiet while a composite is
//! half done, and [`SearchReplace`] rewrites every match of a pattern without
//! tripping over the offsets its own edits shift.

mod change;
mod client;
mod config;
mod error;
mod guard;
mod lock;
mod payload;
mod search;
mod serial;

pub use change::ChangeCoordinator;
pub use client::EditClient;
pub use config::{
  ClientConfig,
  ConfigError,
};
pub use error::{
  EditError,
  Result,
};
pub use guard::{
  NotificationGuard,
  PausedSession,
};
pub use lock::SessionLocks;
pub use payload::Payload;
pub use search::{
  ReplaceOne,
  SearchQuery,
  SearchReplace,
};
pub use serial::Serial;
pub use the_edit_rpc::{
  BYTE_PROFILE_LEN,
  ChangeDetails,
  ChangeKind,
  EditGateway,
  GatewayConfig,
  SessionId,
  TransportError,
};
