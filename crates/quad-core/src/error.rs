//! Error types for `quad-core`.
//!
//! These are the domain rule violations every store backend reports. Storage
//! faults live in the backend's own error type, which exposes the domain error
//! through [`crate::store::StoreError`].

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("Cannot follow yourself")]
  SelfFollow,

  #[error("Cannot create a conversation with yourself.")]
  SelfConversation,

  #[error("You are not a participant in this conversation.")]
  NotParticipant,

  #[error("A user with this seat number already exists")]
  SeatNumberTaken,

  #[error("{0}")]
  Permission(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Validation(String),
}

/// Coarse classification used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  Permission,
  NotFound,
}

impl Error {
  /// `"<what> not found"`.
  pub fn not_found(what: &str) -> Self { Self::NotFound(format!("{what} not found")) }

  pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

  pub fn permission(msg: impl Into<String>) -> Self { Self::Permission(msg.into()) }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::SelfFollow
      | Self::SelfConversation
      | Self::SeatNumberTaken
      | Self::Validation(_) => ErrorKind::Validation,
      Self::NotParticipant | Self::Permission(_) => ErrorKind::Permission,
      Self::NotFound(_) => ErrorKind::NotFound,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reject empty (after trimming) required text, returning the trimmed value.
pub fn require_text(field: &str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  Ok(trimmed.to_owned())
}
