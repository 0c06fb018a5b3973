//! [`AccountStore`] for [`SqliteStore`].

use quad_core::{
  Error as CoreError,
  store::AccountStore,
  user::{Credentials, NewUser, Profile, ProfileUpdate, User, UserView, validate_email},
};
use rusqlite::OptionalExtension as _;

use super::{SqliteStore, user_exists};
use crate::{
  Error, Result,
  encode::{USER_FROM, encode_dt, now, user_columns, user_view_at},
};

fn read_profile(conn: &rusqlite::Connection, user_id: i64) -> rusqlite::Result<Option<Profile>> {
  conn
    .query_row(
      "SELECT bio, avatar_url, course, interests FROM profiles WHERE user_id = ?1",
      rusqlite::params![user_id],
      |row| {
        Ok(Profile {
          bio:        row.get(0)?,
          avatar_url: row.get(1)?,
          course:     row.get(2)?,
          interests:  row.get(3)?,
        })
      },
    )
    .optional()
}

impl AccountStore for SqliteStore {
  type Error = Error;

  async fn register(&self, input: NewUser) -> Result<User> {
    let input = input.validate()?;
    let created_at = now();
    let at_str = encode_dt(created_at);

    let seat_number = input.seat_number.clone();
    let full_name = input.full_name.clone();
    let university_email = input.university_email.clone();
    let department = input.department.clone();
    let year = input.year;
    let password_hash = input.password_hash;

    let user_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM users WHERE seat_number = ?1",
            rusqlite::params![seat_number],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(Err(CoreError::SeatNumberTaken));
        }

        tx.execute(
          "INSERT INTO users (seat_number, full_name, university_email, year, department, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            seat_number,
            full_name,
            university_email,
            year,
            department,
            password_hash,
            at_str,
          ],
        )?;
        let user_id = tx.last_insert_rowid();
        tx.execute("INSERT INTO profiles (user_id) VALUES (?1)", rusqlite::params![user_id])?;
        tx.commit()?;
        Ok(Ok(user_id))
      })
      .await??;

    tracing::debug!(user_id, "registered user");

    Ok(User {
      id: user_id,
      seat_number: input.seat_number,
      full_name: input.full_name,
      university_email: input.university_email,
      year: input.year,
      department: input.department,
      created_at,
    })
  }

  async fn credentials_by_seat(&self, seat_number: String) -> Result<Option<Credentials>> {
    let seat_number = seat_number.trim().to_owned();
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT user_id, password_hash FROM users WHERE seat_number = ?1",
                rusqlite::params![seat_number],
                |row| Ok(Credentials { user_id: row.get(0)?, password_hash: row.get(1)? }),
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn credentials_by_id(&self, user_id: i64) -> Result<Option<Credentials>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT user_id, password_hash FROM users WHERE user_id = ?1",
                rusqlite::params![user_id],
                |row| Ok(Credentials { user_id: row.get(0)?, password_hash: row.get(1)? }),
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn set_password_hash(&self, user_id: i64, password_hash: String) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET password_hash = ?1 WHERE user_id = ?2",
          rusqlite::params![password_hash, user_id],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::not_found("User").into());
    }
    Ok(())
  }

  async fn create_session(&self, user_id: i64, token_digest: String) -> Result<()> {
    let at_str = encode_dt(now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_digest, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token_digest, user_id, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn session_user(&self, token_digest: String) -> Result<Option<i64>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT user_id FROM sessions WHERE token_digest = ?1",
                rusqlite::params![token_digest],
                |r| r.get(0),
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn get_user(&self, user_id: i64) -> Result<Option<UserView>> {
    let sql = format!("SELECT {} FROM {USER_FROM} WHERE u.user_id = ?1", user_columns("u", "p"));
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(&sql, rusqlite::params![user_id], |row| user_view_at(row, 0))
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn get_profile(&self, actor: i64) -> Result<Profile> {
    let profile = self.conn.call(move |conn| Ok(read_profile(conn, actor)?)).await?;
    profile.ok_or_else(|| Error::Core(CoreError::not_found("Profile")))
  }

  async fn update_profile(&self, actor: i64, update: ProfileUpdate) -> Result<Profile> {
    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction()?;
          if !user_exists(&tx, actor)? {
            return Ok(Err(CoreError::not_found("User")));
          }
          // A profile is created at registration; recreate it if it went missing.
          tx.execute(
            "INSERT OR IGNORE INTO profiles (user_id) VALUES (?1)",
            rusqlite::params![actor],
          )?;
          let mut profile = read_profile(&tx, actor)?.unwrap_or_default();
          profile.apply(update);
          tx.execute(
            "UPDATE profiles SET bio = ?1, avatar_url = ?2, course = ?3, interests = ?4
             WHERE user_id = ?5",
            rusqlite::params![
              profile.bio,
              profile.avatar_url,
              profile.course,
              profile.interests,
              actor,
            ],
          )?;
          tx.commit()?;
          Ok(Ok(profile))
        })
        .await??,
    )
  }

  async fn update_email(&self, actor: i64, email: String) -> Result<String> {
    let email = validate_email(&email)?;
    let stored = email.clone();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET university_email = ?1 WHERE user_id = ?2",
          rusqlite::params![stored, actor],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::not_found("User").into());
    }
    Ok(email)
  }
}
