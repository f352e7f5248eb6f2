//! Email delivery through a transactional outbox.
//!
//! Messages are written to `email_outbox` with status `pending` on the
//! caller's connection, so they commit or roll back with the caller's
//! transaction. An external mailer polls that table, delivers, and marks
//! rows `sent` or `failed`.

use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::email::errors::EmailDeliveryError;
use crate::domain::email::models::EmailMessage;

/// Write `message` to the outbox on `conn`.
///
/// # Returns
/// The outbox row id
///
/// # Errors
/// * `SerializationFailed` - Template data is not valid JSON
/// * `EnqueueFailed` - Insert failed
pub async fn enqueue(
    conn: &mut PgConnection,
    message: &EmailMessage,
) -> Result<Uuid, EmailDeliveryError> {
    let payload = serde_json::to_string(&message.data)
        .map_err(|e| EmailDeliveryError::SerializationFailed(e.to_string()))?;
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO email_outbox (id, to_email, subject, template, payload_json, status, created_at)
        VALUES ($1, $2, $3, $4, $5::jsonb, 'pending', $6)
        "#,
    )
    .bind(id)
    .bind(message.to.as_str())
    .bind(&message.subject)
    .bind(&message.template)
    .bind(payload)
    .bind(Utc::now())
    .execute(conn)
    .await
    .map_err(|e| EmailDeliveryError::EnqueueFailed(e.to_string()))?;

    tracing::debug!(outbox_id = %id, template = %message.template, "Email enqueued");

    Ok(id)
}
