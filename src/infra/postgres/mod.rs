pub mod abandon_repo;
pub mod config_repo;
pub mod log_repo;
pub mod product_repo;
pub mod sale_repo;

use {
    crate::domain::{
        abandon::{AbandonFilter, NewAbandon, StoredAbandon},
        config::{GatewayConfig, SyncStatus},
        error::PipelineError,
        product::{ProductRollup, SaleMetrics},
        sale::{NewSale, SaleFilter, StoredSale, StoredSaleItem, UpsertOutcome},
        store::{Page, PageParams, Store},
        webhook_log::{NewWebhookLog, StoredWebhookLog},
    },
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    sqlx::PgPool,
    uuid::Uuid,
};

/// Postgres-backed store. Thin façade over the repo modules so the
/// pipeline depends on [`Store`] only.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn resolve_config(
        &self,
        token: &str,
    ) -> Result<Option<GatewayConfig>, PipelineError> {
        config_repo::resolve(&self.pool, token).await
    }

    async fn update_config_sync(
        &self,
        config_id: Uuid,
        status: SyncStatus,
        last_sync: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        config_repo::update_sync(&self.pool, config_id, status, last_sync).await
    }

    async fn insert_webhook_log(&self, log: &NewWebhookLog) -> Result<(), PipelineError> {
        log_repo::insert(&self.pool, log).await
    }

    async fn mark_log_processed(
        &self,
        log_id: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        log_repo::mark_processed(&self.pool, log_id, processed_at).await
    }

    async fn mark_log_failed(
        &self,
        log_id: Uuid,
        error: &str,
        processed_at: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        log_repo::mark_failed(&self.pool, log_id, error, processed_at).await
    }

    async fn upsert_sale(&self, sale: &NewSale) -> Result<UpsertOutcome, PipelineError> {
        sale_repo::upsert(&self.pool, sale).await
    }

    async fn upsert_abandon(
        &self,
        abandon: &NewAbandon,
    ) -> Result<UpsertOutcome, PipelineError> {
        abandon_repo::upsert(&self.pool, abandon).await
    }

    async fn sale_metrics(
        &self,
        config_id: Uuid,
        product_key: &str,
        approved_status_code: i32,
    ) -> Result<SaleMetrics, PipelineError> {
        sale_repo::metrics(&self.pool, config_id, product_key, approved_status_code).await
    }

    async fn count_abandons(
        &self,
        config_id: Uuid,
        product_key: &str,
    ) -> Result<i64, PipelineError> {
        abandon_repo::count_for_product(&self.pool, config_id, product_key).await
    }

    async fn upsert_product_rollup(&self, rollup: &ProductRollup) -> Result<(), PipelineError> {
        product_repo::upsert_rollup(&self.pool, rollup).await
    }

    async fn list_sales(
        &self,
        filter: &SaleFilter,
        page: PageParams,
    ) -> Result<Page<StoredSale>, PipelineError> {
        sale_repo::list(&self.pool, filter, page).await
    }

    async fn list_abandons(
        &self,
        filter: &AbandonFilter,
        page: PageParams,
    ) -> Result<Page<StoredAbandon>, PipelineError> {
        abandon_repo::list(&self.pool, filter, page).await
    }

    async fn list_products(
        &self,
        config_id: Option<Uuid>,
        page: PageParams,
    ) -> Result<Page<ProductRollup>, PipelineError> {
        product_repo::list(&self.pool, config_id, page).await
    }

    async fn get_sale(
        &self,
        config_id: Uuid,
        transaction_key: &str,
    ) -> Result<Option<StoredSale>, PipelineError> {
        sale_repo::get(&self.pool, config_id, transaction_key).await
    }

    async fn sale_items(&self, sale_id: Uuid) -> Result<Vec<StoredSaleItem>, PipelineError> {
        sale_repo::items(&self.pool, sale_id).await
    }

    async fn get_abandon(
        &self,
        config_id: Uuid,
        abandon_key: &str,
    ) -> Result<Option<StoredAbandon>, PipelineError> {
        abandon_repo::get(&self.pool, config_id, abandon_key).await
    }

    async fn get_product_rollup(
        &self,
        config_id: Uuid,
        product_key: &str,
    ) -> Result<Option<ProductRollup>, PipelineError> {
        product_repo::get(&self.pool, config_id, product_key).await
    }

    async fn webhook_logs(
        &self,
        config_id: Uuid,
    ) -> Result<Vec<StoredWebhookLog>, PipelineError> {
        log_repo::list_for_config(&self.pool, config_id).await
    }
}
