//! Two-party conversations and their messages.
//!
//! A conversation row stores its participants in canonical order (lower id
//! first) so that each unordered pair of users maps to exactly one row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserView;

/// Order two participant ids so the lower one comes first.
pub fn canonical_pair(a: i64, b: i64) -> (i64, i64) {
  if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
  pub id:         i64,
  /// Always less than `user2_id`.
  pub user1_id:   i64,
  pub user2_id:   i64,
  pub created_at: DateTime<Utc>,
}

impl Conversation {
  pub fn has_participant(&self, user_id: i64) -> bool {
    self.user1_id == user_id || self.user2_id == user_id
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  pub id:              i64,
  pub conversation_id: i64,
  pub sender_id:       i64,
  pub text:            String,
  pub created_at:      DateTime<Utc>,
  /// Flipped when the non-sender lists the conversation.
  pub is_read:         bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
  pub id:              i64,
  pub conversation_id: i64,
  pub sender:          UserView,
  pub text:            String,
  pub created_at:      DateTime<Utc>,
  pub is_read:         bool,
}

/// A conversation from one participant's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationView {
  pub id:           i64,
  pub other_user:   UserView,
  pub last_message: Option<MessageView>,
  /// Messages from the other participant not yet read.
  pub unread_count: u64,
}
