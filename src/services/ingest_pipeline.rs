use {
    super::metrics::refresh_product_metrics,
    crate::domain::{
        config::GatewayConfig, error::PipelineError, sale::UpsertOutcome, store::Store,
    },
    crate::normalizer::{NormalizedEvent, NormalizerRegistry},
};

/// What one delivery did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    SaleUpserted(UpsertOutcome),
    AbandonUpserted(UpsertOutcome),
    /// Acknowledged without persistence.
    Unrecognized,
}

impl IngestOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::SaleUpserted(UpsertOutcome::Created(_)) => "sale recorded",
            Self::SaleUpserted(UpsertOutcome::Updated(_)) => "sale updated",
            Self::AbandonUpserted(UpsertOutcome::Created(_)) => "abandon recorded",
            Self::AbandonUpserted(UpsertOutcome::Updated(_)) => "abandon updated",
            Self::Unrecognized => "event acknowledged",
        }
    }
}

/// Run the normalize → upsert → aggregate chain for one delivery. The
/// caller has already resolved the config and written the RECEIVED log
/// row; it owns the PROCESSED/FAILED transition around this call.
pub async fn process_event<S: Store>(
    store: &S,
    registry: &NormalizerRegistry,
    config: &GatewayConfig,
    event_name: &str,
    payload: &serde_json::Value,
) -> Result<IngestOutcome, PipelineError> {
    let normalizer = registry
        .get(config.kind)
        .ok_or_else(|| PipelineError::UnsupportedGateway(config.kind.to_string()))?;

    match normalizer.normalize(config, event_name, payload)? {
        NormalizedEvent::Sale(sale) => {
            let outcome = store.upsert_sale(&sale).await?;
            refresh_product_metrics(store, config, &sale.product_key, &sale.product_name).await?;
            tracing::info!(
                transaction_key = %sale.transaction_key,
                product_key = %sale.product_key,
                ?outcome,
                "sale ingested"
            );
            Ok(IngestOutcome::SaleUpserted(outcome))
        }
        NormalizedEvent::Abandon(abandon) => {
            let outcome = store.upsert_abandon(&abandon).await?;
            refresh_product_metrics(store, config, &abandon.product_key, &abandon.product_name)
                .await?;
            tracing::info!(
                abandon_key = %abandon.abandon_key,
                product_key = %abandon.product_key,
                ?outcome,
                "abandon ingested"
            );
            Ok(IngestOutcome::AbandonUpserted(outcome))
        }
        NormalizedEvent::Unrecognized => {
            tracing::info!(event = %event_name, "unrecognized event acknowledged");
            Ok(IngestOutcome::Unrecognized)
        }
    }
}
