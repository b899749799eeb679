use {
    crate::domain::{
        error::PipelineError,
        webhook_log::{LogStatus, NewWebhookLog, StoredWebhookLog},
    },
    chrono::{DateTime, Utc},
    sqlx::PgPool,
    uuid::Uuid,
};

pub async fn insert(pool: &PgPool, log: &NewWebhookLog) -> Result<(), PipelineError> {
    sqlx::query(
        r#"
        INSERT INTO webhook_logs (id, gateway_config_id, event_name, payload, status)
        VALUES ($1, $2, $3, $4, 'received')
        "#,
    )
    .bind(log.id)
    .bind(log.gateway_config_id)
    .bind(&log.event_name)
    .bind(&log.payload)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_processed(
    pool: &PgPool,
    log_id: Uuid,
    processed_at: DateTime<Utc>,
) -> Result<(), PipelineError> {
    sqlx::query("UPDATE webhook_logs SET status = 'processed', processed_at = $2 WHERE id = $1")
        .bind(log_id)
        .bind(processed_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_failed(
    pool: &PgPool,
    log_id: Uuid,
    error: &str,
    processed_at: DateTime<Utc>,
) -> Result<(), PipelineError> {
    sqlx::query(
        "UPDATE webhook_logs SET status = 'failed', error_message = $2, processed_at = $3 WHERE id = $1",
    )
    .bind(log_id)
    .bind(error)
    .bind(processed_at)
    .execute(pool)
    .await?;
    Ok(())
}

type LogRow = (
    Uuid,
    Uuid,
    String,
    serde_json::Value,
    String,
    Option<String>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

pub async fn list_for_config(
    pool: &PgPool,
    config_id: Uuid,
) -> Result<Vec<StoredWebhookLog>, PipelineError> {
    let rows = sqlx::query_as::<_, LogRow>(
        r#"
        SELECT id, gateway_config_id, event_name, payload, status,
               error_message, received_at, processed_at
        FROM webhook_logs
        WHERE gateway_config_id = $1
        ORDER BY received_at
        "#,
    )
    .bind(config_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(
            |(id, gateway_config_id, event_name, payload, status, error_message, received_at, processed_at)| {
                Ok(StoredWebhookLog {
                    id,
                    gateway_config_id,
                    event_name,
                    payload,
                    status: LogStatus::try_from(status.as_str())?,
                    error_message,
                    received_at,
                    processed_at,
                })
            },
        )
        .collect()
}
