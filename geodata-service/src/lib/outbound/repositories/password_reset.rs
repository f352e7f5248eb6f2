use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgConnection;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::Transaction;
use uuid::Uuid;

use crate::domain::email::models::EmailMessage;
use crate::domain::password_reset::errors::PasswordResetError;
use crate::domain::password_reset::models::PasswordReset;
use crate::domain::password_reset::models::PasswordResetId;
use crate::domain::password_reset::models::ResetStatus;
use crate::domain::password_reset::ports::PasswordResetRepository;
use crate::domain::password_reset::ports::PendingReset;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::outbound::email::outbox;

pub struct PostgresPasswordResetRepository {
    pool: PgPool,
}

impl PostgresPasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Reset row inserted in a transaction that is still open.
pub struct PostgresPendingReset {
    transaction: Transaction<'static, Postgres>,
    reset: PasswordReset,
}

#[async_trait]
impl PendingReset for PostgresPendingReset {
    fn reset(&self) -> &PasswordReset {
        &self.reset
    }

    async fn enqueue_email(&mut self, message: &EmailMessage) -> Result<(), PasswordResetError> {
        outbox::enqueue(&mut *self.transaction, message).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PasswordResetError> {
        let pending = *self;
        pending.transaction.commit().await.map_err(database_error)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PasswordResetRow {
    id: Uuid,
    user_id: Uuid,
    token: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PasswordResetRow> for PasswordReset {
    type Error = PasswordResetError;

    fn try_from(row: PasswordResetRow) -> Result<Self, Self::Error> {
        Ok(PasswordReset {
            id: PasswordResetId(row.id),
            user_id: UserId(row.user_id),
            token: row.token,
            status: row
                .status
                .parse::<ResetStatus>()
                .map_err(|e| PasswordResetError::DatabaseError(e.to_string()))?,
            created_at: row.created_at,
        })
    }
}

fn database_error(e: sqlx::Error) -> PasswordResetError {
    PasswordResetError::DatabaseError(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

async fn insert_reset(
    conn: &mut PgConnection,
    reset: &PasswordReset,
) -> Result<(), PasswordResetError> {
    sqlx::query(
        r#"
        INSERT INTO password_resets (id, user_id, token, status, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(reset.id.0)
    .bind(reset.user_id.0)
    .bind(&reset.token)
    .bind(reset.status.as_str())
    .bind(reset.created_at)
    .execute(conn)
    .await
    .map_err(database_error)?;

    Ok(())
}

#[async_trait]
impl PasswordResetRepository for PostgresPasswordResetRepository {
    async fn begin_issue(
        &self,
        reset: PasswordReset,
    ) -> Result<Box<dyn PendingReset>, PasswordResetError> {
        let mut transaction = self.pool.begin().await.map_err(database_error)?;
        insert_reset(&mut *transaction, &reset).await?;

        Ok(Box::new(PostgresPendingReset { transaction, reset }))
    }

    async fn begin_registration(
        &self,
        user: &User,
        reset: PasswordReset,
    ) -> Result<Box<dyn PendingReset>, PasswordResetError> {
        let mut transaction = self.pool.begin().await.map_err(database_error)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, status, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(user.password_hash.as_deref())
        .bind(user.status.as_str())
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&mut *transaction)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PasswordResetError::EmailTaken
            } else {
                database_error(e)
            }
        })?;

        insert_reset(&mut *transaction, &reset).await?;

        Ok(Box::new(PostgresPendingReset { transaction, reset }))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>, PasswordResetError> {
        let row = sqlx::query_as::<_, PasswordResetRow>(
            r#"
            SELECT id, user_id, token, status, created_at
            FROM password_resets
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.map(PasswordReset::try_from).transpose()
    }

    async fn consume(
        &self,
        reset: &PasswordReset,
        password_hash: &str,
    ) -> Result<(), PasswordResetError> {
        let mut transaction = self.pool.begin().await.map_err(database_error)?;

        // A concurrent consumer blocks on the row lock and then matches nothing.
        let deactivated = sqlx::query(
            r#"
            UPDATE password_resets
            SET status = 'INACTIVE'
            WHERE id = $1 AND status = 'ACTIVE'
            "#,
        )
        .bind(reset.id.0)
        .execute(&mut *transaction)
        .await
        .map_err(database_error)?;

        if deactivated.rows_affected() == 0 {
            return Err(PasswordResetError::AlreadyConsumed);
        }

        let updated = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, status = 'ACTIVE'
            WHERE id = $1
            "#,
        )
        .bind(reset.user_id.0)
        .bind(password_hash)
        .execute(&mut *transaction)
        .await
        .map_err(database_error)?;

        if updated.rows_affected() == 0 {
            return Err(PasswordResetError::DatabaseError(format!(
                "user {} of reset {} no longer exists",
                reset.user_id, reset.id
            )));
        }

        transaction.commit().await.map_err(database_error)
    }
}
