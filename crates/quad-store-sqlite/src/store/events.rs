//! [`EventStore`] for [`SqliteStore`].

use quad_core::{
  Error as CoreError,
  event::{
    AttendanceStatus, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, Event, EventUpdate, EventView, NewEvent,
  },
  notification::{Engagement, NewNotification},
  store::EventStore,
};
use rusqlite::{Connection, OptionalExtension as _, Params, Row};

use super::{
  EVENT, SqliteStore, check_owner, delete_owned, full_name, insert_notification, require_row,
};
use crate::{
  Result,
  encode::{count_at, dt_at, encode_dt, encode_status, now, user_columns, user_view_at},
};

const EVENT_COLUMNS: &str = "event_id, title, description, location, latitude, longitude,
  start_date, end_date, created_by, created_at, updated_at";

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
  Ok(Event {
    id:          row.get(0)?,
    title:       row.get(1)?,
    description: row.get(2)?,
    location:    row.get(3)?,
    latitude:    row.get(4)?,
    longitude:   row.get(5)?,
    start_date:  dt_at(row, 6)?,
    end_date:    dt_at(row, 7)?,
    created_by:  row.get(8)?,
    created_at:  dt_at(row, 9)?,
    updated_at:  dt_at(row, 10)?,
  })
}

fn read_event(conn: &Connection, event_id: i64) -> rusqlite::Result<Option<Event>> {
  conn
    .query_row(
      &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
      [event_id],
      event_from_row,
    )
    .optional()
}

/// Events as seen by viewer `?1`, latest start first.
fn query_event_views<P: Params>(
  conn: &Connection,
  filter: &str,
  params: P,
) -> rusqlite::Result<Vec<EventView>> {
  let sql = format!(
    "SELECT e.event_id, e.title, e.description, e.location, e.latitude, e.longitude,
            e.start_date, e.end_date, e.created_at, e.updated_at,
            (SELECT COUNT(*) FROM event_attendances
              WHERE event_id = e.event_id AND status = 'interested'),
            (SELECT COUNT(*) FROM event_attendances
              WHERE event_id = e.event_id AND status = 'going'),
            EXISTS (SELECT 1 FROM event_attendances
                     WHERE event_id = e.event_id AND user_id = ?1 AND status = 'interested'),
            EXISTS (SELECT 1 FROM event_attendances
                     WHERE event_id = e.event_id AND user_id = ?1 AND status = 'going'),
            {}
       FROM events e
       JOIN users u ON u.user_id = e.created_by
       LEFT JOIN profiles p ON p.user_id = u.user_id
      WHERE {filter}
      ORDER BY e.start_date DESC, e.event_id DESC",
    user_columns("u", "p"),
  );
  let mut stmt = conn.prepare(&sql)?;
  let events = stmt
    .query_map(params, |row| {
      Ok(EventView {
        id:               row.get(0)?,
        title:            row.get(1)?,
        description:      row.get(2)?,
        location:         row.get(3)?,
        latitude:         row.get(4)?,
        longitude:        row.get(5)?,
        start_date:       dt_at(row, 6)?,
        end_date:         dt_at(row, 7)?,
        created_at:       dt_at(row, 8)?,
        updated_at:       dt_at(row, 9)?,
        interested_count: count_at(row, 10)?,
        going_count:      count_at(row, 11)?,
        is_interested:    row.get(12)?,
        is_going:         row.get(13)?,
        created_by:       user_view_at(row, 14)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(events)
}

impl EventStore for SqliteStore {
  async fn create_event(&self, actor: i64, input: NewEvent) -> Result<Event> {
    let input = input.validate()?;
    let at = now();

    let event = self
      .conn
      .call(move |conn| {
        let mut event = Event {
          id:          0,
          title:       input.title,
          description: input.description,
          location:    input.location,
          latitude:    input.latitude.unwrap_or(DEFAULT_LATITUDE),
          longitude:   input.longitude.unwrap_or(DEFAULT_LONGITUDE),
          start_date:  input.start_date,
          end_date:    input.end_date,
          created_by:  actor,
          created_at:  at,
          updated_at:  at,
        };
        conn.execute(
          "INSERT INTO events (title, description, location, latitude, longitude,
                               start_date, end_date, created_by, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
          rusqlite::params![
            event.title,
            event.description,
            event.location,
            event.latitude,
            event.longitude,
            encode_dt(event.start_date),
            encode_dt(event.end_date),
            actor,
            encode_dt(at),
          ],
        )?;
        event.id = conn.last_insert_rowid();
        Ok(event)
      })
      .await?;

    tracing::debug!(event_id = event.id, created_by = actor, "created event");
    Ok(event)
  }

  async fn list_events(&self, actor: i64) -> Result<Vec<EventView>> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(query_event_views(conn, "1 = 1", [actor])?))
        .await?,
    )
  }

  async fn get_event(&self, actor: i64, event_id: i64) -> Result<Option<EventView>> {
    let mut views = self
      .conn
      .call(move |conn| {
        Ok(query_event_views(conn, "e.event_id = ?2", rusqlite::params![actor, event_id])?)
      })
      .await?;
    Ok(views.pop())
  }

  async fn update_event(&self, actor: i64, event_id: i64, update: EventUpdate) -> Result<Event> {
    let at = now();
    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          if let Err(e) =
            check_owner(&tx, &EVENT, event_id, actor, "You can only edit your own events.")?
          {
            return Ok(Err(e));
          }
          let Some(mut event) = read_event(&tx, event_id)? else {
            return Ok(Err(CoreError::not_found("Event")));
          };
          if let Err(e) = event.apply(update) {
            return Ok(Err(e));
          }
          event.updated_at = at;

          tx.execute(
            "UPDATE events
                SET title = ?1, description = ?2, location = ?3, latitude = ?4, longitude = ?5,
                    start_date = ?6, end_date = ?7, updated_at = ?8
              WHERE event_id = ?9",
            rusqlite::params![
              event.title,
              event.description,
              event.location,
              event.latitude,
              event.longitude,
              encode_dt(event.start_date),
              encode_dt(event.end_date),
              encode_dt(at),
              event_id,
            ],
          )?;
          tx.commit()?;
          Ok(Ok(event))
        })
        .await??,
    )
  }

  async fn delete_event(&self, actor: i64, event_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        Ok(delete_owned(conn, &EVENT, event_id, actor, "You can only delete your own events.")?)
      })
      .await??;
    tracing::debug!(event_id, "deleted event");
    Ok(())
  }

  async fn set_attendance(
    &self,
    actor: i64,
    event_id: i64,
    status: AttendanceStatus,
  ) -> Result<Engagement> {
    let at = now();
    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          let Some(event) = read_event(&tx, event_id)? else {
            return Ok(Err(CoreError::not_found("Event")));
          };

          let existed = tx
            .query_row(
              "SELECT 1 FROM event_attendances WHERE user_id = ?1 AND event_id = ?2",
              rusqlite::params![actor, event_id],
              |_| Ok(()),
            )
            .optional()?
            .is_some();

          tx.execute(
            "INSERT INTO event_attendances (user_id, event_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, event_id) DO UPDATE SET status = excluded.status",
            rusqlite::params![actor, event_id, encode_status(status), encode_dt(at)],
          )?;

          let created = !existed;
          let notification = if created && event.created_by != actor {
            let name = full_name(&tx, actor)?.unwrap_or_default();
            Some(insert_notification(
              &tx,
              NewNotification::event_rsvp(
                event.created_by,
                actor,
                &name,
                status,
                event_id,
                &event.title,
              ),
              at,
            )?)
          } else {
            None
          };

          tx.commit()?;
          Ok(Ok(Engagement { created, notification }))
        })
        .await??,
    )
  }

  async fn clear_attendance(&self, actor: i64, event_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        if let Err(e) = require_row(conn, &EVENT, event_id)? {
          return Ok(Err(e));
        }
        conn.execute(
          "DELETE FROM event_attendances WHERE user_id = ?1 AND event_id = ?2",
          rusqlite::params![actor, event_id],
        )?;
        Ok(Ok(()))
      })
      .await??;
    Ok(())
  }
}
