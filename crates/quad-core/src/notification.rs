//! Notifications fanned out on social actions, and push-token registry.
//!
//! Notifications are a pure sink: every triggering action appends one row and
//! nothing is ever deduplicated. Follows, post likes, comments and event RSVPs
//! notify; comment likes, story likes, story replies and messages do not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{event::AttendanceStatus, user::UserView};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
  Like,
  Comment,
  Follow,
  Message,
  Event,
}

impl NotificationKind {
  /// Title shown on the device when the notification is pushed.
  pub fn push_title(self) -> &'static str {
    match self {
      Self::Like => "New like",
      Self::Comment => "New comment",
      Self::Follow => "New follower",
      Self::Message => "New message",
      Self::Event => "Event update",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub id:                i64,
  /// The recipient.
  pub user_id:           i64,
  pub actor_id:          Option<i64>,
  #[serde(rename = "type")]
  pub kind:              NotificationKind,
  pub text:              String,
  /// Id of the post, event or user the notification refers to.
  pub related_object_id: Option<i64>,
  pub is_read:           bool,
  pub created_at:        DateTime<Utc>,
}

/// Input to [`crate::store::NotificationStore::notify`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
  pub user_id:           i64,
  pub actor_id:          Option<i64>,
  pub kind:              NotificationKind,
  pub text:              String,
  pub related_object_id: Option<i64>,
}

impl NewNotification {
  pub fn followed(target: i64, actor: i64, actor_name: &str) -> Self {
    Self {
      user_id:           target,
      actor_id:          Some(actor),
      kind:              NotificationKind::Follow,
      text:              format!("{actor_name} started following you"),
      related_object_id: Some(actor),
    }
  }

  pub fn post_liked(author: i64, actor: i64, actor_name: &str, post_id: i64) -> Self {
    Self {
      user_id:           author,
      actor_id:          Some(actor),
      kind:              NotificationKind::Like,
      text:              format!("{actor_name} liked your post"),
      related_object_id: Some(post_id),
    }
  }

  pub fn commented(author: i64, actor: i64, actor_name: &str, post_id: i64) -> Self {
    Self {
      user_id:           author,
      actor_id:          Some(actor),
      kind:              NotificationKind::Comment,
      text:              format!("{actor_name} commented on your post"),
      related_object_id: Some(post_id),
    }
  }

  pub fn event_rsvp(
    creator: i64,
    actor: i64,
    actor_name: &str,
    status: AttendanceStatus,
    event_id: i64,
    event_title: &str,
  ) -> Self {
    let text = match status {
      AttendanceStatus::Interested => {
        format!("{actor_name} is interested in your event: {event_title}")
      }
      AttendanceStatus::Going => format!("{actor_name} is going to your event: {event_title}"),
    };
    Self {
      user_id: creator,
      actor_id: Some(actor),
      kind: NotificationKind::Event,
      text,
      related_object_id: Some(event_id),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationView {
  pub id:                i64,
  #[serde(rename = "type")]
  pub kind:              NotificationKind,
  pub text:              String,
  pub actor:             Option<UserView>,
  pub related_object_id: Option<i64>,
  pub is_read:           bool,
  pub created_at:        DateTime<Utc>,
}

/// Outcome of an idempotent engagement (follow, like, RSVP).
///
/// `created` is true only for the call that inserted the row; `notification`
/// is the row fanned out to the affected party, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Engagement {
  pub created:      bool,
  pub notification: Option<Notification>,
}

// ─── Push tokens ─────────────────────────────────────────────────────────────

/// A device token registered for push delivery. Unique per (user, token).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushToken {
  pub user_id:    i64,
  pub token:      String,
  pub created_at: DateTime<Utc>,
}
