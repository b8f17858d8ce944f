//! Test doubles for the edit gateway.
//!
//! [`MemoryGateway`] keeps each session as a plain byte vector so tests can
//! drive the client end to end without a running service.

mod memory;

pub use memory::{
  Fault,
  GatewayCall,
  MemoryGateway,
};
