use {
    crate::domain::{
        config::GatewayConfig,
        error::PipelineError,
        product::{ProductRollup, product_key_hash},
        store::Store,
    },
};

/// Recompute the per-product rollup from committed rows and overwrite it.
///
/// Counters are never incremented in place: a retried or out-of-order
/// delivery changes the underlying rows idempotently, and the recompute
/// lands on the same totals no matter how many times it runs.
pub async fn refresh_product_metrics<S: Store>(
    store: &S,
    config: &GatewayConfig,
    product_key: &str,
    product_name: &str,
) -> Result<(), PipelineError> {
    let sales = store
        .sale_metrics(config.id, product_key, config.kind.approved_status_code())
        .await?;
    let total_abandons = store.count_abandons(config.id, product_key).await?;

    store
        .upsert_product_rollup(&ProductRollup {
            gateway_config_id: config.id,
            product_key: product_key.to_string(),
            product_key_hash: product_key_hash(product_key),
            product_name: product_name.to_string(),
            total_sales: sales.total_sales,
            total_revenue: sales.total_revenue,
            total_abandons,
        })
        .await
}
