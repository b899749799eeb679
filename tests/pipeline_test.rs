mod common;

use {
    common::*,
    sale_sync::{
        domain::{
            error::PipelineError,
            sale::UpsertOutcome,
            store::{PageParams, Store},
        },
        infra::memory::MemStore,
        normalizer::NormalizerRegistry,
        services::ingest_pipeline::{IngestOutcome, process_event},
    },
};

async fn ingest(
    store: &MemStore,
    config: &sale_sync::domain::config::GatewayConfig,
    payload: &serde_json::Value,
) -> Result<IngestOutcome, PipelineError> {
    let registry = NormalizerRegistry::with_defaults();
    let event = payload
        .get("event")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    process_event(store, &registry, config, event, payload).await
}

// ── 1. idempotent_redelivery_keeps_one_sale ────────────────────────────────

#[tokio::test]
async fn idempotent_redelivery_keeps_one_sale() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    let payload = sale_payload("T1", "P1", 100.0, 2);
    for _ in 0..3 {
        ingest(&store, &config, &payload).await.unwrap();
    }

    let page = store
        .list_sales(&Default::default(), PageParams::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    let rollup = store.get_product_rollup(config.id, "P1").await.unwrap().unwrap();
    assert_eq!(rollup.total_sales, 1);
    assert_eq!(rollup.total_revenue.value(), 10000);
}

// ── 2. redelivery_replaces_item_set ────────────────────────────────────────

#[tokio::test]
async fn redelivery_replaces_item_set() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    let mut first = sale_payload("T1", "P1", 100.0, 2);
    first["data"]["items"] = serde_json::json!([
        { "prod_key": "P1", "value": 60.0, "amount": 1, "main": true },
        { "prod_key": "P9", "value": 40.0, "amount": 2 }
    ]);
    let outcome = ingest(&store, &config, &first).await.unwrap();
    let IngestOutcome::SaleUpserted(UpsertOutcome::Created(sale_id)) = outcome else {
        panic!("expected a created sale, got {outcome:?}");
    };
    assert_eq!(store.sale_items(sale_id).await.unwrap().len(), 2);

    let mut second = sale_payload("T1", "P1", 100.0, 2);
    second["data"]["items"] =
        serde_json::json!([{ "prod_key": "P2", "value": 100.0, "amount": 1 }]);
    let outcome = ingest(&store, &config, &second).await.unwrap();
    let IngestOutcome::SaleUpserted(UpsertOutcome::Updated(updated_id)) = outcome else {
        panic!("expected an updated sale, got {outcome:?}");
    };
    assert_eq!(updated_id, sale_id);

    let items = store.sale_items(sale_id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_key, "P2");
    assert_eq!(items[0].unit_value.value(), 10000);
}

// ── 3. latest_payload_overwrites_mutable_fields ────────────────────────────

#[tokio::test]
async fn latest_payload_overwrites_mutable_fields() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    ingest(&store, &config, &sale_payload("T1", "P1", 100.0, 1))
        .await
        .unwrap();
    ingest(&store, &config, &sale_payload("T1", "P1", 120.0, 2))
        .await
        .unwrap();

    let sale = store.get_sale(config.id, "T1").await.unwrap().unwrap();
    assert_eq!(sale.status_code, 2);
    assert_eq!(sale.trans_value.value(), 12000);
}

// ── 4. revenue_counts_only_approved_sales ──────────────────────────────────

#[tokio::test]
async fn revenue_counts_only_approved_sales() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    ingest(&store, &config, &sale_payload("T1", "P1", 50.0, 2))
        .await
        .unwrap();
    ingest(&store, &config, &sale_payload("T2", "P1", 30.0, 1))
        .await
        .unwrap();

    let rollup = store.get_product_rollup(config.id, "P1").await.unwrap().unwrap();
    assert_eq!(rollup.total_sales, 2);
    assert_eq!(rollup.total_revenue.value(), 5000);
}

// ── 5. abandon_dedup_is_keyed_on_raw_created_string ────────────────────────

#[tokio::test]
async fn abandon_dedup_is_keyed_on_raw_created_string() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    let first = abandon_payload("P1", Some("ana@x.com"), "2024-01-01 10:00:00");
    ingest(&store, &config, &first).await.unwrap();
    let outcome = ingest(&store, &config, &first).await.unwrap();
    assert!(matches!(
        outcome,
        IngestOutcome::AbandonUpserted(UpsertOutcome::Updated(_))
    ));

    // Same product and email, different raw creation string: a new cart.
    let third = abandon_payload("P1", Some("ana@x.com"), "2024-01-02 09:30:00");
    let outcome = ingest(&store, &config, &third).await.unwrap();
    assert!(matches!(
        outcome,
        IngestOutcome::AbandonUpserted(UpsertOutcome::Created(_))
    ));

    let page = store
        .list_abandons(&Default::default(), PageParams::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let rollup = store.get_product_rollup(config.id, "P1").await.unwrap().unwrap();
    assert_eq!(rollup.total_abandons, 2);
}

// ── 6. abandon_refresh_keeps_first_seen_identity_fields ────────────────────

#[tokio::test]
async fn abandon_refresh_keeps_first_seen_identity_fields() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    let first = abandon_payload("P1", Some("ana@x.com"), "2024-01-01 10:00:00");
    ingest(&store, &config, &first).await.unwrap();

    let mut second = abandon_payload("P1", Some("ana@x.com"), "2024-01-01 10:00:00");
    second["data"]["prod_name"] = serde_json::json!("Renamed Course");
    second["data"]["plan_key"] = serde_json::json!("PL9");
    second["data"]["plan_name"] = serde_json::json!("Discounted");
    second["data"]["cli_name"] = serde_json::json!("Bia");
    ingest(&store, &config, &second).await.unwrap();

    let key = "P1:ana@x.com:2024-01-01 10:00:00";
    let abandon = store.get_abandon(config.id, key).await.unwrap().unwrap();
    assert_eq!(abandon.product_name, "Course");
    assert_eq!(abandon.plan_key.as_deref(), Some("PL1"));
    assert_eq!(abandon.plan_name.as_deref(), Some("Discounted"));
    assert_eq!(abandon.client.name.as_deref(), Some("Bia"));
}

// ── 7. missing_email_keys_abandon_as_unknown ───────────────────────────────

#[tokio::test]
async fn missing_email_keys_abandon_as_unknown() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    let payload = abandon_payload("P1", None, "2024-01-01 10:00:00");
    ingest(&store, &config, &payload).await.unwrap();

    let key = "P1:unknown:2024-01-01 10:00:00";
    assert!(store.get_abandon(config.id, key).await.unwrap().is_some());
}

// ── 8. abandon_then_sale_share_one_rollup ──────────────────────────────────

#[tokio::test]
async fn abandon_then_sale_share_one_rollup() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    ingest(
        &store,
        &config,
        &abandon_payload("P1", Some("ana@x.com"), "2024-01-01 10:00:00"),
    )
    .await
    .unwrap();
    ingest(&store, &config, &sale_payload("T1", "P1", 100.0, 2))
        .await
        .unwrap();

    let rollup = store.get_product_rollup(config.id, "P1").await.unwrap().unwrap();
    assert_eq!(rollup.total_sales, 1);
    assert_eq!(rollup.total_revenue.value(), 10000);
    assert_eq!(rollup.total_abandons, 1);

    let page = store.list_products(Some(config.id), PageParams::default()).await.unwrap();
    assert_eq!(page.total, 1);
}

// ── 9. unrecognized_event_persists_nothing ─────────────────────────────────

#[tokio::test]
async fn unrecognized_event_persists_nothing() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    let payload = serde_json::json!({ "event": "subscription_canceled", "data": {} });
    let outcome = ingest(&store, &config, &payload).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Unrecognized));

    let sales = store
        .list_sales(&Default::default(), PageParams::default())
        .await
        .unwrap();
    assert_eq!(sales.total, 0);
}

// ── 10. unsupported_gateway_is_a_pipeline_error ────────────────────────────

#[tokio::test]
async fn unsupported_gateway_is_a_pipeline_error() {
    let store = MemStore::new();
    let config = hotmart_config();
    store.add_config(config.clone()).await;

    let err = ingest(&store, &config, &sale_payload("T1", "P1", 10.0, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnsupportedGateway(_)));
}

// ── 11. money_fidelity_through_the_pipeline ────────────────────────────────

#[tokio::test]
async fn money_fidelity_through_the_pipeline() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    let mut payload = sale_payload("T1", "P1", 19.9, 2);
    payload["data"]["trans_total_value"] = serde_json::json!(199.9);
    ingest(&store, &config, &payload).await.unwrap();

    let sale = store.get_sale(config.id, "T1").await.unwrap().unwrap();
    assert_eq!(sale.trans_value.value(), 1990);
    assert_eq!(sale.trans_total_value.value(), 19990);
}

// ── 12. sale_listing_filters ───────────────────────────────────────────────

#[tokio::test]
async fn sale_listing_filters() {
    let store = MemStore::new();
    let config = braip_config();
    store.add_config(config.clone()).await;

    ingest(&store, &config, &sale_payload("T1", "P1", 50.0, 2))
        .await
        .unwrap();
    ingest(&store, &config, &sale_payload("T2", "P2", 30.0, 1))
        .await
        .unwrap();

    let filter = sale_sync::domain::sale::SaleFilter {
        gateway_config_id: Some(config.id),
        status_code: Some(2),
        ..Default::default()
    };
    let page = store.list_sales(&filter, PageParams::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].transaction_key, "T1");

    let filter = sale_sync::domain::sale::SaleFilter {
        search: Some("ana@x".into()),
        ..Default::default()
    };
    let page = store.list_sales(&filter, PageParams::default()).await.unwrap();
    assert_eq!(page.total, 2);
}
