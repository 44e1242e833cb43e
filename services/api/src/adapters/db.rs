//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `MapStore`, `AccountService` and `IdentityService` ports from the `core` crate.
//! It handles all interactions with the PostgreSQL database using `sqlx`.
//!
//! Map documents are stored as one JSONB object per row so that legacy field
//! sets survive untouched; partial updates are JSONB merges.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mind_mapper_core::domain::{MapFields, StoredMap, User, UserCredentials};
use mind_mapper_core::ports::{
    AccountService, IdentityService, MapStore, MapStream, PortError, PortResult,
};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage and identity ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct MapRecord {
    id: Uuid,
    user_id: Uuid,
    fields: Json<MapFields>,
}
impl MapRecord {
    fn to_domain(self) -> StoredMap {
        StoredMap {
            id: self.id,
            user_id: self.user_id,
            fields: self.fields.0,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserRecord {
    fn to_credentials(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct AuthSessionRecord {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

//=========================================================================================
// `MapStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl MapStore for DbAdapter {
    async fn create_map(&self, user_id: Uuid, fields: MapFields) -> PortResult<StoredMap> {
        let record = sqlx::query_as::<_, MapRecord>(
            "INSERT INTO maps (id, user_id, fields) VALUES ($1, $2, $3) RETURNING id, user_id, fields",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(Json(fields))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_map(&self, user_id: Uuid, map_id: Uuid) -> PortResult<StoredMap> {
        let record = sqlx::query_as::<_, MapRecord>(
            "SELECT id, user_id, fields FROM maps WHERE id = $1 AND user_id = $2",
        )
        .bind(map_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Map {} not found", map_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn update_map(&self, user_id: Uuid, map_id: Uuid, updates: MapFields) -> PortResult<()> {
        let result = sqlx::query("UPDATE maps SET fields = fields || $3 WHERE id = $1 AND user_id = $2")
            .bind(map_id)
            .bind(user_id)
            .bind(Json(updates))
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Map {} not found", map_id)));
        }
        Ok(())
    }

    fn stream_maps(&self, user_id: Uuid) -> MapStream<'_> {
        let stream = sqlx::query_as::<_, MapRecord>(
            "SELECT id, user_id, fields FROM maps WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch(&self.pool)
        .map_ok(MapRecord::to_domain)
        .map_err(unexpected);
        Box::pin(stream)
    }
}

//=========================================================================================
// `AccountService` and `IdentityService` Trait Implementations
//=========================================================================================

#[async_trait]
impl AccountService for DbAdapter {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email, hashed_password",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                PortError::Conflict(format!("User {} already exists", email))
            }
            _ => unexpected(e),
        })?;
        Ok(User {
            user_id: record.user_id,
            email: record.email,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_credentials())
    }

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[async_trait]
impl IdentityService for DbAdapter {
    async fn verify_token(&self, token: &str) -> PortResult<Uuid> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT user_id, expires_at FROM auth_sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)?;

        if record.expires_at <= Utc::now() {
            return Err(PortError::Unauthorized);
        }
        Ok(record.user_id)
    }
}
