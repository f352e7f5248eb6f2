use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::api_key::errors::ApiKeyError;
use crate::domain::api_key::models::ApiKey;
use crate::domain::api_key::models::ApiKeyId;
use crate::domain::api_key::ports::ApiKeyRepository;
use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;

fn database_error(e: sqlx::Error) -> ApiKeyError {
    ApiKeyError::DatabaseError(e.to_string())
}

pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ApiKeyRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    key: String,
    owner_role: String,
    last_used_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    usage_count: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ApiKeyRow> for ApiKey {
    type Error = ApiKeyError;

    fn try_from(row: ApiKeyRow) -> Result<Self, Self::Error> {
        Ok(ApiKey {
            id: ApiKeyId(row.id),
            user_id: UserId(row.user_id),
            name: row.name,
            key: row.key,
            owner_role: row
                .owner_role
                .parse::<Role>()
                .map_err(|e| ApiKeyError::InvalidStoredValue(e.to_string()))?,
            last_used_at: row.last_used_at,
            expires_at: row.expires_at,
            usage_count: row.usage_count,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn find_active_by_key(&self, key: &str) -> Result<Option<ApiKey>, ApiKeyError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT k.id, k.user_id, k.name, k.key, u.role AS owner_role,
                   k.last_used_at, k.expires_at, k.usage_count, k.is_active, k.created_at
            FROM api_keys k
            JOIN users u ON u.id = k.user_id
            WHERE k.key = $1 AND k.is_active
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(ApiKey::try_from).transpose()
    }

    async fn increment_usage(&self, id: &ApiKeyId) -> Result<(), ApiKeyError> {
        sqlx::query(
            r#"
            UPDATE api_keys
            SET usage_count = usage_count + 1, last_used_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn create(&self, key: &ApiKey) -> Result<(), ApiKeyError> {
        sqlx::query(
            r#"
            INSERT INTO api_keys (id, user_id, name, key, last_used_at, expires_at,
                                  usage_count, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(key.id.0)
        .bind(key.user_id.0)
        .bind(&key.name)
        .bind(&key.key)
        .bind(key.last_used_at)
        .bind(key.expires_at)
        .bind(key.usage_count)
        .bind(key.is_active)
        .bind(key.created_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<ApiKey>, ApiKeyError> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            SELECT k.id, k.user_id, k.name, k.key, u.role AS owner_role,
                   k.last_used_at, k.expires_at, k.usage_count, k.is_active, k.created_at
            FROM api_keys k
            JOIN users u ON u.id = k.user_id
            WHERE k.user_id = $1
            ORDER BY k.created_at DESC
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.into_iter().map(ApiKey::try_from).collect()
    }

    async fn delete(&self, user_id: &UserId, id: &ApiKeyId) -> Result<bool, ApiKeyError> {
        let result = sqlx::query(
            r#"
            DELETE FROM api_keys
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id.0)
        .bind(user_id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }
}
