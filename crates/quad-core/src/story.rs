//! Ephemeral stories and their replies.
//!
//! A story is visible for 24 hours after it is posted. The expiry instant is
//! fixed at creation and never moves.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, error::require_text, user::UserView};

/// How long a story stays visible.
pub fn story_ttl() -> TimeDelta { TimeDelta::hours(24) }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
  pub id:         i64,
  pub author_id:  i64,
  pub image_url:  String,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Story {
  pub fn is_visible_at(&self, at: DateTime<Utc>) -> bool { at < self.expires_at }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStory {
  pub image_url: String,
}

impl NewStory {
  pub fn validate(mut self) -> Result<Self> {
    self.image_url = require_text("image_url", &self.image_url)?;
    Ok(self)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryView {
  pub id:          i64,
  pub author:      UserView,
  pub image_url:   String,
  pub created_at:  DateTime<Utc>,
  pub expires_at:  DateTime<Utc>,
  pub like_count:  u64,
  pub is_liked:    bool,
  pub reply_count: u64,
}

// ─── Replies ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryReply {
  pub id:         i64,
  pub story_id:   i64,
  pub author_id:  i64,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStoryReply {
  #[serde(rename = "story")]
  pub story_id: i64,
  pub content:  String,
}

impl NewStoryReply {
  pub fn validate(mut self) -> Result<Self> {
    self.content = require_text("content", &self.content)?;
    Ok(self)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryReplyView {
  pub id:         i64,
  pub story_id:   i64,
  pub author:     UserView,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}
