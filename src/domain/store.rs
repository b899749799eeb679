use {
    super::abandon::{AbandonFilter, NewAbandon, StoredAbandon},
    super::config::{GatewayConfig, SyncStatus},
    super::error::PipelineError,
    super::product::{ProductRollup, SaleMetrics},
    super::sale::{NewSale, SaleFilter, StoredSale, StoredSaleItem, UpsertOutcome},
    super::webhook_log::{NewWebhookLog, StoredWebhookLog},
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// 1-based page request; out-of-range values are clamped, not rejected.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageParams {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// The persistent store is the only shared mutable resource of the
/// pipeline; every component treats it as the sole source of truth and
/// never caches sale/abandon/product state in process memory.
///
/// Implementations must make `upsert_sale`/`upsert_abandon` atomic per
/// natural key: concurrent same-key deliveries resolve to last-write-wins
/// with no duplicate rows and no mixed item sets.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Token lookup, filtered to active configs. Unknown and inactive
    /// tokens are both `None`.
    async fn resolve_config(&self, token: &str) -> Result<Option<GatewayConfig>, PipelineError>;

    async fn update_config_sync(
        &self,
        config_id: Uuid,
        status: SyncStatus,
        last_sync: DateTime<Utc>,
    ) -> Result<(), PipelineError>;

    async fn insert_webhook_log(&self, log: &NewWebhookLog) -> Result<(), PipelineError>;

    async fn mark_log_processed(
        &self,
        log_id: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<(), PipelineError>;

    async fn mark_log_failed(
        &self,
        log_id: Uuid,
        error: &str,
        processed_at: DateTime<Utc>,
    ) -> Result<(), PipelineError>;

    /// Full-row overwrite on (gateway_config_id, transaction_key); the item
    /// set is replaced wholesale, never merged.
    async fn upsert_sale(&self, sale: &NewSale) -> Result<UpsertOutcome, PipelineError>;

    /// Conflict on (gateway_config_id, abandon_key) refreshes contact,
    /// names, plan amount and the update timestamp only; product_name and
    /// plan_key stay as first seen.
    async fn upsert_abandon(&self, abandon: &NewAbandon) -> Result<UpsertOutcome, PipelineError>;

    /// Count of all sales plus revenue restricted to the approved status
    /// code, recomputed from committed rows.
    async fn sale_metrics(
        &self,
        config_id: Uuid,
        product_key: &str,
        approved_status_code: i32,
    ) -> Result<SaleMetrics, PipelineError>;

    async fn count_abandons(
        &self,
        config_id: Uuid,
        product_key: &str,
    ) -> Result<i64, PipelineError>;

    /// Overwrites the rollup row keyed by (gateway_config_id,
    /// product_key_hash) with freshly computed values.
    async fn upsert_product_rollup(&self, rollup: &ProductRollup) -> Result<(), PipelineError>;

    async fn list_sales(
        &self,
        filter: &SaleFilter,
        page: PageParams,
    ) -> Result<Page<StoredSale>, PipelineError>;

    async fn list_abandons(
        &self,
        filter: &AbandonFilter,
        page: PageParams,
    ) -> Result<Page<StoredAbandon>, PipelineError>;

    async fn list_products(
        &self,
        config_id: Option<Uuid>,
        page: PageParams,
    ) -> Result<Page<ProductRollup>, PipelineError>;

    async fn get_sale(
        &self,
        config_id: Uuid,
        transaction_key: &str,
    ) -> Result<Option<StoredSale>, PipelineError>;

    async fn sale_items(&self, sale_id: Uuid) -> Result<Vec<StoredSaleItem>, PipelineError>;

    async fn get_abandon(
        &self,
        config_id: Uuid,
        abandon_key: &str,
    ) -> Result<Option<StoredAbandon>, PipelineError>;

    async fn get_product_rollup(
        &self,
        config_id: Uuid,
        product_key: &str,
    ) -> Result<Option<ProductRollup>, PipelineError>;

    async fn webhook_logs(
        &self,
        config_id: Uuid,
    ) -> Result<Vec<StoredWebhookLog>, PipelineError>;
}
