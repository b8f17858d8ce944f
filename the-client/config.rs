use std::{
  fs,
  io,
  path::{
    Path,
    PathBuf,
  },
};

use serde::Deserialize;
use the_edit_rpc::GatewayConfig;
use thiserror::Error;

/// Settings for one [`EditClient`](crate::EditClient).
///
/// ```toml
/// serialize_composites = true
///
/// [gateway]
/// channel_capacity = 32
/// request_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
  /// Queue composite edits per session instead of letting them race.
  pub serialize_composites: bool,
  pub gateway:              GatewayConfig,
}

impl ClientConfig {
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| {
      ConfigError::Io {
        path: path.to_path_buf(),
        source,
      }
    })?;
    Self::from_toml_str(&source)
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    let config = ClientConfig::from_toml_str("").unwrap();
    assert_eq!(config, ClientConfig::default());
    assert!(!config.serialize_composites);
    assert_eq!(config.gateway.request_timeout(), None);
  }

  #[test]
  fn gateway_table_is_read() {
    let config = ClientConfig::from_toml_str(
      r#"
        serialize_composites = true

        [gateway]
        channel_capacity = 8
        request_timeout_ms = 250
      "#,
    )
    .unwrap();
    assert!(config.serialize_composites);
    assert_eq!(config.gateway.channel_capacity, 8);
    assert_eq!(
      config.gateway.request_timeout(),
      Some(Duration::from_millis(250))
    );
  }

  #[test]
  fn unknown_keys_are_rejected() {
    let err = ClientConfig::from_toml_str("serialise_composites = true").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
  }

  #[test]
  fn load_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.toml");
    fs::write(&path, "serialize_composites = true\n").unwrap();
    assert!(ClientConfig::load(&path).unwrap().serialize_composites);

    let missing = dir.path().join("missing.toml");
    let err = ClientConfig::load(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::Io { path, .. } if path == missing));
  }
}
