//! Account and site-settings storage for SQL backends.
//!
//! Page trees live in [`super::pages`].

use chrono::{DateTime, Utc};

use crate::Result;
use crate::backend::errors::BackendError;
use crate::model::{ColorSchemeId, NewUser, User, UserId};
use crate::settings::{ColorScheme, GlobalSettings, NewColorScheme};

use super::{SqlxBackend, SqlxResultExt};

pub(super) type UserRow = (
    i64,
    String,
    String,
    i64,
    i64,
    Option<String>,
    Option<i64>,
    Option<String>,
);

pub(super) const USER_COLUMNS: &str =
    "id, username, email, is_staff, date_joined, avatar, color_scheme_id, password_hash";

pub(super) fn flag(value: bool) -> i64 {
    i64::from(value)
}

pub(super) fn user_from_row(row: UserRow) -> Result<User> {
    let (id, username, email, is_staff, joined_ms, avatar, color_scheme, password_hash) = row;
    let date_joined = DateTime::<Utc>::from_timestamp_millis(joined_ms).ok_or_else(|| {
        BackendError::StateInconsistency {
            reason: format!("user {id} has an out-of-range join time {joined_ms}"),
        }
    })?;
    Ok(User {
        id: UserId(id),
        username,
        email,
        is_staff: is_staff != 0,
        date_joined,
        avatar,
        color_scheme: color_scheme.map(ColorSchemeId),
        password_hash,
    })
}

/// Fail with `UserNotFound` unless the account exists.
pub(super) async fn require_user(
    conn: &mut sqlx::AnyConnection,
    id: UserId,
) -> Result<()> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .sql_context("Failed to look up user")?;
    match row {
        Some(_) => Ok(()),
        None => Err(BackendError::UserNotFound { id }.into()),
    }
}

async fn username_taken(
    conn: &mut sqlx::AnyConnection,
    username: &str,
    except: Option<UserId>,
) -> Result<bool> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&mut *conn)
            .await
            .sql_context("Failed to check username")?;
    Ok(row.is_some_and(|(id,)| Some(UserId(id)) != except))
}

/// Insert an account. Usernames are unique case-insensitively.
pub async fn create_user(backend: &SqlxBackend, new: NewUser) -> Result<User> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    if username_taken(&mut tx, &new.username, None).await? {
        return Err(BackendError::UsernameTaken {
            username: new.username,
        }
        .into());
    }

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (username, email, is_staff, date_joined, password_hash)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(&new.username)
    .bind(&new.email)
    .bind(flag(new.is_staff))
    .bind(new.date_joined.timestamp_millis())
    .bind(new.password_hash.as_deref())
    .fetch_one(&mut *tx)
    .await
    .unique_or(
        || BackendError::UsernameTaken {
            username: new.username.clone(),
        },
        "Failed to insert user",
    )?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;

    Ok(User {
        id: UserId(id),
        username: new.username,
        email: new.email,
        is_staff: new.is_staff,
        date_joined: new.date_joined,
        avatar: None,
        color_scheme: None,
        password_hash: new.password_hash,
    })
}

/// Get an account by id.
pub async fn get_user(backend: &SqlxBackend, id: UserId) -> Result<User> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(backend.pool())
            .await
            .sql_context("Failed to get user")?;
    match row {
        Some(row) => user_from_row(row),
        None => Err(BackendError::UserNotFound { id }.into()),
    }
}

/// Find an account by username, ignoring case.
pub async fn find_user_by_username(backend: &SqlxBackend, username: &str) -> Result<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1)"
    ))
    .bind(username)
    .fetch_optional(backend.pool())
    .await
    .sql_context("Failed to find user")?;
    row.map(user_from_row).transpose()
}

/// All accounts, ordered by id.
pub async fn list_users(backend: &SqlxBackend) -> Result<Vec<User>> {
    let rows: Vec<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(backend.pool())
            .await
            .sql_context("Failed to list users")?;
    rows.into_iter().map(user_from_row).collect()
}

pub async fn rename_user(backend: &SqlxBackend, id: UserId, username: &str) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    require_user(&mut tx, id).await?;
    if username_taken(&mut tx, username, Some(id)).await? {
        return Err(BackendError::UsernameTaken {
            username: username.to_string(),
        }
        .into());
    }

    sqlx::query("UPDATE users SET username = $1 WHERE id = $2")
        .bind(username)
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .unique_or(
            || BackendError::UsernameTaken {
                username: username.to_string(),
            },
            "Failed to rename user",
        )?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

pub async fn set_avatar(backend: &SqlxBackend, id: UserId, avatar: Option<&str>) -> Result<()> {
    let result = sqlx::query("UPDATE users SET avatar = $1 WHERE id = $2")
        .bind(avatar)
        .bind(id.get())
        .execute(backend.pool())
        .await
        .sql_context("Failed to set avatar")?;
    if result.rows_affected() == 0 {
        return Err(BackendError::UserNotFound { id }.into());
    }
    Ok(())
}

pub async fn set_color_scheme(
    backend: &SqlxBackend,
    id: UserId,
    scheme: Option<ColorSchemeId>,
) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    require_user(&mut tx, id).await?;
    if let Some(scheme) = scheme {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM color_schemes WHERE id = $1")
            .bind(scheme.get())
            .fetch_optional(&mut *tx)
            .await
            .sql_context("Failed to look up color scheme")?;
        if row.is_none() {
            return Err(BackendError::ColorSchemeNotFound { id: scheme }.into());
        }
    }

    sqlx::query("UPDATE users SET color_scheme_id = $1 WHERE id = $2")
        .bind(scheme.map(ColorSchemeId::get))
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to set color scheme")?;

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}

// ----- site settings -----

/// Read the settings singleton, `None` when it was never written.
pub async fn load_settings(backend: &SqlxBackend) -> Result<Option<GlobalSettings>> {
    let row: Option<(i64, i64, i64)> = sqlx::query_as(
        "SELECT ntfy_active, daily_mail_active, daily_mail_include_registrations
         FROM global_settings WHERE id = 1",
    )
    .fetch_optional(backend.pool())
    .await
    .sql_context("Failed to load settings")?;

    Ok(row.map(|(ntfy, mail, registrations)| GlobalSettings {
        ntfy_active: ntfy != 0,
        daily_mail_active: mail != 0,
        daily_mail_include_registrations: registrations != 0,
    }))
}

/// Write the settings singleton.
pub async fn store_settings(backend: &SqlxBackend, settings: &GlobalSettings) -> Result<()> {
    let statement = if backend.is_sqlite() {
        "INSERT OR REPLACE INTO global_settings
            (id, ntfy_active, daily_mail_active, daily_mail_include_registrations)
         VALUES (1, $1, $2, $3)"
    } else {
        "INSERT INTO global_settings
            (id, ntfy_active, daily_mail_active, daily_mail_include_registrations)
         VALUES (1, $1, $2, $3)
         ON CONFLICT (id) DO UPDATE SET
            ntfy_active = EXCLUDED.ntfy_active,
            daily_mail_active = EXCLUDED.daily_mail_active,
            daily_mail_include_registrations = EXCLUDED.daily_mail_include_registrations"
    };

    sqlx::query(statement)
        .bind(flag(settings.ntfy_active))
        .bind(flag(settings.daily_mail_active))
        .bind(flag(settings.daily_mail_include_registrations))
        .execute(backend.pool())
        .await
        .sql_context("Failed to store settings")?;
    Ok(())
}

type SchemeRow = (i64, String, i64, String, String);

fn scheme_from_row(row: SchemeRow) -> Result<ColorScheme> {
    let (id, name, is_dark, preview_json, css_variables) = row;
    let preview_colors = serde_json::from_str(&preview_json)
        .map_err(|e| BackendError::DeserializationFailed { source: e })?;
    Ok(ColorScheme {
        id: ColorSchemeId(id),
        name,
        is_dark: is_dark != 0,
        preview_colors,
        css_variables,
    })
}

pub async fn list_color_schemes(backend: &SqlxBackend) -> Result<Vec<ColorScheme>> {
    let rows: Vec<SchemeRow> = sqlx::query_as(
        "SELECT id, name, is_dark, preview_colors, css_variables
         FROM color_schemes ORDER BY id",
    )
    .fetch_all(backend.pool())
    .await
    .sql_context("Failed to list color schemes")?;
    rows.into_iter().map(scheme_from_row).collect()
}

pub async fn get_color_scheme(backend: &SqlxBackend, id: ColorSchemeId) -> Result<ColorScheme> {
    let row: Option<SchemeRow> = sqlx::query_as(
        "SELECT id, name, is_dark, preview_colors, css_variables
         FROM color_schemes WHERE id = $1",
    )
    .bind(id.get())
    .fetch_optional(backend.pool())
    .await
    .sql_context("Failed to get color scheme")?;
    match row {
        Some(row) => scheme_from_row(row),
        None => Err(BackendError::ColorSchemeNotFound { id }.into()),
    }
}

pub async fn add_color_scheme(backend: &SqlxBackend, scheme: &NewColorScheme) -> Result<ColorScheme> {
    let preview_json = serde_json::to_string(&scheme.preview_colors)
        .map_err(|e| BackendError::SerializationFailed { source: e })?;

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO color_schemes (name, is_dark, preview_colors, css_variables)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(&scheme.name)
    .bind(flag(scheme.is_dark))
    .bind(&preview_json)
    .bind(&scheme.css_variables)
    .fetch_one(backend.pool())
    .await
    .sql_context("Failed to insert color scheme")?;

    Ok(ColorScheme {
        id: ColorSchemeId(id),
        name: scheme.name.clone(),
        is_dark: scheme.is_dark,
        preview_colors: scheme.preview_colors.clone(),
        css_variables: scheme.css_variables.clone(),
    })
}

/// Delete a scheme, clearing it from every account that selected it.
pub async fn delete_color_scheme(backend: &SqlxBackend, id: ColorSchemeId) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    sqlx::query("UPDATE users SET color_scheme_id = NULL WHERE color_scheme_id = $1")
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to clear color scheme selections")?;

    let result = sqlx::query("DELETE FROM color_schemes WHERE id = $1")
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete color scheme")?;
    if result.rows_affected() == 0 {
        return Err(BackendError::ColorSchemeNotFound { id }.into());
    }

    tx.commit()
        .await
        .sql_context("Failed to commit transaction")?;
    Ok(())
}
