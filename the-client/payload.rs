/// Bytes sent to the service as edit data or a search pattern.
///
/// Text converts to its UTF-8 bytes. The length is always the byte length,
/// embedded zero bytes included; nothing is ever inferred from the content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Payload(Vec<u8>);

impl Payload {
  pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
    Self(bytes.into())
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  pub fn into_vec(self) -> Vec<u8> {
    self.0
  }

  pub(crate) fn byte_len(&self) -> u64 {
    self.0.len() as u64
  }
}

impl AsRef<[u8]> for Payload {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

impl From<Vec<u8>> for Payload {
  fn from(bytes: Vec<u8>) -> Self {
    Self(bytes)
  }
}

impl From<&[u8]> for Payload {
  fn from(bytes: &[u8]) -> Self {
    Self(bytes.to_vec())
  }
}

impl<const N: usize> From<&[u8; N]> for Payload {
  fn from(bytes: &[u8; N]) -> Self {
    Self(bytes.to_vec())
  }
}

impl From<String> for Payload {
  fn from(text: String) -> Self {
    Self(text.into_bytes())
  }
}

impl From<&str> for Payload {
  fn from(text: &str) -> Self {
    Self(text.as_bytes().to_vec())
  }
}

impl From<&Payload> for Payload {
  fn from(payload: &Payload) -> Self {
    payload.clone()
  }
}
