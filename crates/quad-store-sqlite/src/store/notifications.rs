//! [`NotificationStore`] for [`SqliteStore`].

use quad_core::{
  Error as CoreError,
  error::require_text,
  notification::{NewNotification, Notification, NotificationView, PushToken},
  store::NotificationStore,
};

use super::{SqliteStore, insert_notification, user_exists};
use crate::{
  Result,
  encode::{dt_at, encode_dt, kind_at, now, opt_user_view_at, user_columns},
};

impl NotificationStore for SqliteStore {
  async fn notify(&self, input: NewNotification) -> Result<Notification> {
    let at = now();
    Ok(
      self
        .conn
        .call(move |conn| {
          if !user_exists(conn, input.user_id)? {
            return Ok(Err(CoreError::not_found("User")));
          }
          Ok(Ok(insert_notification(conn, input, at)?))
        })
        .await??,
    )
  }

  async fn list_notifications(&self, user_id: i64) -> Result<Vec<NotificationView>> {
    let sql = format!(
      "SELECT n.notification_id, n.kind, n.text, n.related_object_id, n.is_read, n.created_at, {}
         FROM notifications n
         LEFT JOIN users u ON u.user_id = n.actor_id
         LEFT JOIN profiles p ON p.user_id = u.user_id
        WHERE n.user_id = ?1
        ORDER BY n.created_at DESC, n.notification_id DESC",
      user_columns("u", "p"),
    );
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let views = stmt
            .query_map([user_id], |row| {
              Ok(NotificationView {
                id:                row.get(0)?,
                kind:              kind_at(row, 1)?,
                text:              row.get(2)?,
                related_object_id: row.get(3)?,
                is_read:           row.get(4)?,
                created_at:        dt_at(row, 5)?,
                actor:             opt_user_view_at(row, 6)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(views)
        })
        .await?,
    )
  }

  async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
          [user_id],
        )?)
      })
      .await?;
    Ok(changed as u64)
  }

  async fn mark_read(&self, user_id: i64, notification_id: i64) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1 WHERE notification_id = ?1 AND user_id = ?2",
          rusqlite::params![notification_id, user_id],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::not_found("Notification").into());
    }
    Ok(())
  }

  async fn register_push_token(&self, user_id: i64, token: String) -> Result<PushToken> {
    let token = require_text("token", &token)?;
    let at = encode_dt(now());
    Ok(
      self
        .conn
        .call(move |conn| {
          if !user_exists(conn, user_id)? {
            return Ok(Err(CoreError::not_found("User")));
          }
          conn.execute(
            "INSERT OR IGNORE INTO push_tokens (user_id, token, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![user_id, token, at],
          )?;
          let created_at = conn.query_row(
            "SELECT created_at FROM push_tokens WHERE user_id = ?1 AND token = ?2",
            rusqlite::params![user_id, token],
            |row| dt_at(row, 0),
          )?;
          Ok(Ok(PushToken { user_id, token, created_at }))
        })
        .await??,
    )
  }

  async fn push_tokens(&self, user_id: i64) -> Result<Vec<String>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(
            "SELECT token FROM push_tokens WHERE user_id = ?1 ORDER BY created_at, token",
          )?;
          let tokens = stmt
            .query_map([user_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
          Ok(tokens)
        })
        .await?,
    )
  }
}
