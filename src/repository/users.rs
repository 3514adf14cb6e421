//! Users repository for Postgres

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{InsertOneResult, Role, UpdateResult, User},
};

use super::UsersStore;

#[derive(Debug, FromRow)]
struct UserRow {
    email: String,
    username: Option<String>,
    password_hash: Option<String>,
    roles: Vec<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            roles: Role::from_tags(row.roles),
        }
    }
}

#[derive(Clone)]
pub struct PgUsersStore {
    pool: Pool<Postgres>,
}

impl PgUsersStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(pool: &Pool<Postgres>) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                email TEXT PRIMARY KEY,
                username TEXT,
                password_hash TEXT,
                roles TEXT[] NOT NULL DEFAULT ARRAY['VIEW_ALL']::TEXT[],
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UsersStore for PgUsersStore {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        tracing::debug!(email, "users.find_one");
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT email, username, password_hash, roles FROM users WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user.map(User::from))
    }

    async fn insert(&self, user: &User) -> AppResult<InsertOneResult> {
        tracing::debug!(email = %user.email, "users.insert_one");
        sqlx::query(
            r#"
            INSERT INTO users (email, username, password_hash, roles)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(Role::to_tags(&user.roles))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("User Already Registered".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(InsertOneResult::new(user.email.clone()))
    }

    async fn upsert_roles(&self, email: &str, roles: &[Role]) -> AppResult<UpdateResult> {
        tracing::debug!(email, ?roles, "users.update_one upsert");
        // xmax is zero only on rows created by this statement.
        // No row comes back when the stored roles already match.
        let inserted: Option<bool> = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, roles) VALUES ($1, $2)
            ON CONFLICT (email) DO UPDATE SET roles = EXCLUDED.roles
            WHERE users.roles IS DISTINCT FROM EXCLUDED.roles
            RETURNING (xmax = 0)
            "#,
        )
        .bind(email)
        .bind(Role::to_tags(roles))
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(true) => UpdateResult::upserted(email),
            Some(false) => UpdateResult::matched(true),
            None => UpdateResult::matched(false),
        })
    }
}
