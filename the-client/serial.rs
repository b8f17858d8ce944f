use std::{
  fmt,
  num::NonZeroI64,
};

/// Identifier the service assigns to an applied edit.
///
/// Positive serials name forward edits, negative ones undone edits. Zero is
/// the service's failure sentinel and cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Serial(NonZeroI64);

impl Serial {
  pub fn from_raw(raw: i64) -> Option<Self> {
    NonZeroI64::new(raw).map(Self)
  }

  pub fn get(self) -> i64 {
    self.0.get()
  }

  pub fn is_undo(self) -> bool {
    self.0.get() < 0
  }
}

impl fmt::Display for Serial {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<Serial> for i64 {
  fn from(serial: Serial) -> Self {
    serial.get()
  }
}
