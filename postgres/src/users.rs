//! `PostgreSQL` user and token store.

use crate::error::{classify, is_violation};
use slotbook_core::{BookingError, Identity, NewUser, Result, UserId, UserRecord, UserStore};
use sqlx::PgPool;
use sqlx::error::ErrorKind;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    is_staff: bool,
    is_superuser: bool,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            username: row.username,
            password_hash: row.password_hash,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
        }
    }
}

/// User store backed by a `PgPool`.
#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for PgUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        let inserted: std::result::Result<(i64,), sqlx::Error> = sqlx::query_as(
            r"
            INSERT INTO users (username, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok((id,)) => Ok(UserRecord {
                id: UserId::new(id),
                username: user.username,
                password_hash: user.password_hash,
                is_staff: user.is_staff,
                is_superuser: user.is_superuser,
            }),
            Err(error) if is_violation(&error, ErrorKind::UniqueViolation) => {
                Err(BookingError::Validation("Username already exists".into()))
            }
            Err(error) => Err(classify(error)),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, username, password_hash, is_staff, is_superuser
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        Ok(row.map(UserRecord::from))
    }

    async fn get_or_create_token(&self, user_id: UserId, candidate: String) -> Result<String> {
        let inserted = sqlx::query(
            r"
            INSERT INTO auth_tokens (token, user_id) VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(&candidate)
        .bind(user_id.get())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(result) if result.rows_affected() == 1 => return Ok(candidate),
            Ok(_) => {}
            Err(error) if is_violation(&error, ErrorKind::ForeignKeyViolation) => {
                return Err(BookingError::user_not_found(user_id));
            }
            Err(error) => return Err(classify(error)),
        }

        let (token,): (String,) = sqlx::query_as("SELECT token FROM auth_tokens WHERE user_id = $1")
            .bind(user_id.get())
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        Ok(token)
    }

    async fn identity_for_token(&self, token: &str) -> Result<Option<Identity>> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT u.id, u.username, u.password_hash, u.is_staff, u.is_superuser
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = $1
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        Ok(row.map(|row| UserRecord::from(row).identity()))
    }

    async fn promote_to_admin(&self, user_id: UserId) -> Result<()> {
        let updated = sqlx::query("UPDATE users SET is_staff = TRUE WHERE id = $1")
            .bind(user_id.get())
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        if updated.rows_affected() == 0 {
            return Err(BookingError::user_not_found(user_id));
        }
        Ok(())
    }
}
