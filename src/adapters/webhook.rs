use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::{
            config::SyncStatus, error::PipelineError, store::Store, webhook_log::NewWebhookLog,
        },
        services::ingest_pipeline::process_event,
    },
    axum::{
        Json,
        extract::{Path, State},
    },
    chrono::Utc,
    serde::Serialize,
};

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
}

/// Per-request state machine: RECEIVED → PROCESSED | FAILED.
///
/// Unknown tokens and gateway-type mismatches short-circuit before any log
/// row exists; there is nothing to attribute them to. Once the RECEIVED
/// row is written, every outcome of the processing chain transitions it —
/// no partial-success log state exists.
#[tracing::instrument(
    name = "webhook",
    skip_all,
    fields(gateway = tracing::field::Empty, event = tracing::field::Empty)
)]
pub async fn gateway_webhook_handler<S: Store>(
    State(state): State<AppState<S>>,
    Path((gateway, token)): Path<(String, String)>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<WebhookResponse>, ApiError> {
    tracing::Span::current().record("gateway", tracing::field::display(&gateway));

    let config = state
        .store
        .resolve_config(&token)
        .await?
        .ok_or(PipelineError::ConfigNotFound)?;

    if !config.matches_route(&gateway) {
        return Err(PipelineError::GatewayMismatch {
            requested: gateway,
            actual: config.kind.to_string(),
        }
        .into());
    }

    let event_name = payload
        .get("event")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();
    tracing::Span::current().record("event", tracing::field::display(&event_name));

    let log = NewWebhookLog::new(config.id, &event_name, payload.clone());
    state.store.insert_webhook_log(&log).await?;
    tracing::info!(log_id = %log.id, "webhook received");

    match process_event(
        state.store.as_ref(),
        &state.normalizers,
        &config,
        &event_name,
        &payload,
    )
    .await
    {
        Ok(outcome) => {
            let now = Utc::now();
            state.store.mark_log_processed(log.id, now).await?;
            state
                .store
                .update_config_sync(config.id, SyncStatus::Completed, now)
                .await?;
            Ok(Json(WebhookResponse {
                success: true,
                message: outcome.message().to_string(),
            }))
        }
        Err(err) => {
            let now = Utc::now();
            // Best-effort: the FAILED transition must not mask the
            // original error.
            if let Err(log_err) = state
                .store
                .mark_log_failed(log.id, &err.to_string(), now)
                .await
            {
                tracing::error!(error = %log_err, "could not mark webhook log as failed");
            }
            if let Err(sync_err) = state
                .store
                .update_config_sync(config.id, SyncStatus::Error, now)
                .await
            {
                tracing::error!(error = %sync_err, "could not update config sync status");
            }
            Err(err.into())
        }
    }
}
