use {
    crate::domain::{
        config::{GatewayConfig, GatewayKind, SyncStatus, WebhookToken},
        error::PipelineError,
    },
    chrono::{DateTime, Utc},
    sqlx::PgPool,
    uuid::Uuid,
};

type ConfigRow = (
    Uuid,
    Uuid,
    String,
    String,
    bool,
    String,
    Option<DateTime<Utc>>,
);

fn from_row(row: ConfigRow) -> Result<GatewayConfig, PipelineError> {
    let (id, tenant_id, kind, token, is_active, sync_status, last_sync) = row;
    Ok(GatewayConfig {
        id,
        tenant_id,
        kind: GatewayKind::try_from(kind.as_str())?,
        token: WebhookToken::new(token)?,
        is_active,
        sync_status: SyncStatus::try_from(sync_status.as_str())?,
        last_sync,
    })
}

/// Token lookup restricted to active configs. Inactive and unknown tokens
/// both come back as `None`.
pub async fn resolve(pool: &PgPool, token: &str) -> Result<Option<GatewayConfig>, PipelineError> {
    let row = sqlx::query_as::<_, ConfigRow>(
        r#"
        SELECT id, tenant_id, gateway_kind, webhook_token, is_active, sync_status, last_sync
        FROM gateway_configs
        WHERE webhook_token = $1 AND is_active = true
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

pub async fn update_sync(
    pool: &PgPool,
    config_id: Uuid,
    status: SyncStatus,
    last_sync: DateTime<Utc>,
) -> Result<(), PipelineError> {
    sqlx::query("UPDATE gateway_configs SET sync_status = $2, last_sync = $3 WHERE id = $1")
        .bind(config_id)
        .bind(status.as_str())
        .bind(last_sync)
        .execute(pool)
        .await?;
    Ok(())
}
