//! Campus events and attendance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result, error::require_text, user::UserView};

/// Coordinates used when an event is created without a location pin.
pub const DEFAULT_LATITUDE: f64 = 24.8607;
pub const DEFAULT_LONGITUDE: f64 = 67.0011;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub id:          i64,
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub latitude:    f64,
  pub longitude:   f64,
  pub start_date:  DateTime<Utc>,
  pub end_date:    DateTime<Utc>,
  pub created_by:  i64,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
  pub title:       String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub location:    String,
  pub latitude:    Option<f64>,
  pub longitude:   Option<f64>,
  pub start_date:  DateTime<Utc>,
  pub end_date:    DateTime<Utc>,
}

impl NewEvent {
  pub fn validate(mut self) -> Result<Self> {
    self.title = require_text("title", &self.title)?;
    check_range(self.start_date, self.end_date)?;
    Ok(self)
  }
}

/// Partial edit applied by the event's creator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdate {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub location:    Option<String>,
  pub latitude:    Option<f64>,
  pub longitude:   Option<f64>,
  pub start_date:  Option<DateTime<Utc>>,
  pub end_date:    Option<DateTime<Utc>>,
}

impl Event {
  /// Apply `update` in place, re-checking the invariants it could break.
  pub fn apply(&mut self, update: EventUpdate) -> Result<()> {
    if let Some(title) = update.title {
      self.title = require_text("title", &title)?;
    }
    if let Some(description) = update.description {
      self.description = description;
    }
    if let Some(location) = update.location {
      self.location = location;
    }
    if let Some(latitude) = update.latitude {
      self.latitude = latitude;
    }
    if let Some(longitude) = update.longitude {
      self.longitude = longitude;
    }
    if let Some(start_date) = update.start_date {
      self.start_date = start_date;
    }
    if let Some(end_date) = update.end_date {
      self.end_date = end_date;
    }
    check_range(self.start_date, self.end_date)
  }
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
  if end < start {
    return Err(Error::validation("end_date must not be before start_date"));
  }
  Ok(())
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
  Interested,
  Going,
}

/// One row per (user, event); repeated RSVPs overwrite `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAttendance {
  pub user_id:    i64,
  pub event_id:   i64,
  pub status:     AttendanceStatus,
  pub created_at: DateTime<Utc>,
}

/// An event as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventView {
  pub id:               i64,
  pub title:            String,
  pub description:      String,
  pub location:         String,
  pub latitude:         f64,
  pub longitude:        f64,
  pub start_date:       DateTime<Utc>,
  pub end_date:         DateTime<Utc>,
  pub created_by:       UserView,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
  pub interested_count: u64,
  pub going_count:      u64,
  pub is_interested:    bool,
  pub is_going:         bool,
}
