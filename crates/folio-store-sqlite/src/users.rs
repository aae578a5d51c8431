//! [`UserStore`] and [`ProfileStore`] for [`SqliteStore`].

use std::collections::HashSet;

use chrono::Utc;
use folio_core::{
  UserId,
  store::{ProfileStore, UserStore},
  user::{Credential, NewUser, Profile, User, UserUpdate},
};
use rusqlite::{OptionalExtension as _, ToSql};

use crate::{
  Error, Result, SqliteStore,
  encode::{PROFILE_COLUMNS, RawProfile, RawUser, USER_COLUMNS, encode_dt, encode_id_set},
  error::map_write_error,
};

fn read_user(
  conn:   &rusqlite::Connection,
  clause: &str,
  param:  &dyn ToSql,
) -> rusqlite::Result<Option<RawUser>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users u WHERE {clause}"),
      [param],
      RawUser::from_row,
    )
    .optional()
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = Error;

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let email      = input.email.clone();
    let username   = input.username.clone();
    let hash       = input.password_hash.as_str().to_owned();

    let user_id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (email, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![email, username, hash, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await
      .map_err(map_write_error)?;

    tracing::debug!(user_id, "user row created");

    Ok(User {
      user_id: UserId::new(user_id),
      email: input.email,
      username: input.username,
      bio: None,
      image: None,
      created_at,
    })
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Credential>> {
    let email = email.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(read_user(conn, "u.email = ?1", &email)?))
      .await?;
    raw.map(RawUser::into_credential).transpose()
  }

  async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
    let raw = self
      .conn
      .call(move |conn| Ok(read_user(conn, "u.user_id = ?1", &id.get())?))
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(read_user(conn, "u.username = ?1", &username)?))
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User> {
    let raw_id = id.get();
    let hash   = update.password_hash.map(|h| h.as_str().to_owned());

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users SET
             email         = COALESCE(?2, email),
             username      = COALESCE(?3, username),
             bio           = COALESCE(?4, bio),
             image         = COALESCE(?5, image),
             password_hash = COALESCE(?6, password_hash)
           WHERE user_id = ?1",
          rusqlite::params![
            raw_id,
            update.email,
            update.username,
            update.bio,
            update.image,
            hash,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(read_user(conn, "u.user_id = ?1", &raw_id)?)
      })
      .await
      .map_err(map_write_error)?;

    raw
      .ok_or_else(|| Error::NotFound(format!("user {id}")))?
      .into_user()
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  async fn get_profile(&self, username: &str) -> Result<Option<Profile>> {
    let username = username.to_owned();
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM users u WHERE u.username = ?1"),
            [username],
            |row| RawProfile::from_row_at(row, 0),
          )
          .optional()?)
      })
      .await?;
    Ok(raw.map(RawProfile::into_profile))
  }

  async fn follow_user(&self, follower: UserId, followee: UserId) -> Result<bool> {
    let at_str = encode_dt(Utc::now());
    let (a, b) = (follower.get(), followee.get());

    // Inserts a new edge or revives a soft-deleted one; an already active
    // edge is left untouched and reports zero changes.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO follows (follower_id, followee_id, created_at, deleted_at)
           VALUES (?1, ?2, ?3, NULL)
           ON CONFLICT (follower_id, followee_id) DO UPDATE
             SET created_at = excluded.created_at, deleted_at = NULL
             WHERE follows.deleted_at IS NOT NULL",
          rusqlite::params![a, b, at_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn unfollow_user(&self, follower: UserId, followee: UserId) -> Result<bool> {
    let at_str = encode_dt(Utc::now());
    let (a, b) = (follower.get(), followee.get());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE follows SET deleted_at = ?3
           WHERE follower_id = ?1 AND followee_id = ?2 AND deleted_at IS NULL",
          rusqlite::params![a, b, at_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn is_following(&self, follower: UserId, followee: UserId) -> Result<bool> {
    let (a, b) = (follower.get(), followee.get());
    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM follows
             WHERE follower_id = ?1 AND followee_id = ?2 AND deleted_at IS NULL",
            rusqlite::params![a, b],
            |_| Ok(()),
          )
          .optional()?)
      })
      .await?;
    Ok(found.is_some())
  }

  async fn following_status(&self, follower: UserId, followees: &[UserId]) -> Result<Vec<bool>> {
    if followees.is_empty() {
      return Ok(vec![]);
    }
    let ids = encode_id_set(followees.iter().map(|id| id.get()))?;
    let a   = follower.get();

    let active: HashSet<i64> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT followee_id FROM follows
           WHERE follower_id = ?1 AND deleted_at IS NULL
             AND followee_id IN (SELECT value FROM json_each(?2))",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![a, ids], |row| row.get(0))?
          .collect::<rusqlite::Result<HashSet<i64>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(followees.iter().map(|id| active.contains(&id.get())).collect())
  }
}
