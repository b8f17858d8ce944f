use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
  /// Number of requests that may be queued before senders wait.
  pub channel_capacity:   usize,
  /// Per-request deadline. `None` waits for the service indefinitely.
  pub request_timeout_ms: Option<u64>,
}

impl GatewayConfig {
  pub fn request_timeout(&self) -> Option<Duration> {
    self.request_timeout_ms.map(Duration::from_millis)
  }
}

impl Default for GatewayConfig {
  fn default() -> Self {
    Self {
      channel_capacity:   DEFAULT_CHANNEL_CAPACITY,
      request_timeout_ms: None,
    }
  }
}
