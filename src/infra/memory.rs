use {
    crate::domain::{
        abandon::{AbandonFilter, NewAbandon, StoredAbandon},
        config::{GatewayConfig, SyncStatus},
        error::PipelineError,
        money::Cents,
        product::{ProductRollup, SaleMetrics},
        sale::{NewSale, SaleFilter, StoredSale, StoredSaleItem, UpsertOutcome},
        store::{Page, PageParams, Store},
        webhook_log::{LogStatus, NewWebhookLog, StoredWebhookLog},
    },
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    std::collections::HashMap,
    tokio::sync::Mutex,
    uuid::Uuid,
};

/// In-memory store for tests and local experiments. A single mutex makes
/// every operation atomic, which trivially satisfies the same-key
/// last-write-wins requirement the Postgres store meets with advisory
/// locks.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    configs: Vec<GatewayConfig>,
    sales: Vec<StoredSale>,
    sale_items: HashMap<Uuid, Vec<StoredSaleItem>>,
    abandons: Vec<StoredAbandon>,
    products: Vec<ProductRollup>,
    logs: Vec<StoredWebhookLog>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_config(&self, config: GatewayConfig) {
        self.inner.lock().await.configs.push(config);
    }

    /// Direct config read, active or not. Exposed for assertions on the
    /// sync tracking fields.
    pub async fn config(&self, config_id: Uuid) -> Option<GatewayConfig> {
        self.inner
            .lock()
            .await
            .configs
            .iter()
            .find(|c| c.id == config_id)
            .cloned()
    }
}

fn stored_sale(id: Uuid, sale: &NewSale) -> StoredSale {
    StoredSale {
        id,
        gateway_config_id: sale.gateway_config_id,
        transaction_key: sale.transaction_key.clone(),
        product_key: sale.product_key.clone(),
        product_name: sale.product_name.clone(),
        plan_key: sale.plan_key.clone(),
        plan_name: sale.plan_name.clone(),
        trans_value: sale.trans_value,
        trans_total_value: sale.trans_total_value,
        freight_value: sale.freight_value,
        status_code: sale.status_code,
        status_label: sale.status_label.clone(),
        payment_method: sale.payment_method,
        client: sale.client.clone(),
        commission: sale.commission.clone(),
        gateway_created_at: sale.gateway_created_at,
        gateway_updated_at: sale.gateway_updated_at,
    }
}

fn stored_items(sale_id: Uuid, sale: &NewSale) -> Vec<StoredSaleItem> {
    sale.items
        .iter()
        .map(|item| StoredSaleItem {
            id: Uuid::now_v7(),
            sale_id,
            plan_key: item.plan_key.clone(),
            plan_name: item.plan_name.clone(),
            unit_value: item.unit_value,
            quantity: item.quantity,
            product_key: item.product_key.clone(),
            product_type: item.product_type,
            is_main: item.is_main,
        })
        .collect()
}

fn matches_search(needle: &str, haystacks: &[Option<&str>]) -> bool {
    let needle = needle.to_lowercase();
    haystacks
        .iter()
        .flatten()
        .any(|h| h.to_lowercase().contains(&needle))
}

fn paginate<T: Clone>(mut items: Vec<T>, page: PageParams) -> Page<T> {
    let total = items.len() as i64;
    let start = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let items = if start >= items.len() {
        Vec::new()
    } else {
        items
            .drain(start..)
            .take(page.per_page as usize)
            .collect()
    };
    Page {
        items,
        page: page.page,
        per_page: page.per_page,
        total,
    }
}

#[async_trait]
impl Store for MemStore {
    async fn resolve_config(
        &self,
        token: &str,
    ) -> Result<Option<GatewayConfig>, PipelineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .configs
            .iter()
            .find(|c| c.is_active && c.token.as_str() == token)
            .cloned())
    }

    async fn update_config_sync(
        &self,
        config_id: Uuid,
        status: SyncStatus,
        last_sync: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().await;
        if let Some(config) = inner.configs.iter_mut().find(|c| c.id == config_id) {
            config.sync_status = status;
            config.last_sync = Some(last_sync);
        }
        Ok(())
    }

    async fn insert_webhook_log(&self, log: &NewWebhookLog) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().await;
        inner.logs.push(StoredWebhookLog {
            id: log.id,
            gateway_config_id: log.gateway_config_id,
            event_name: log.event_name.clone(),
            payload: log.payload.clone(),
            status: LogStatus::Received,
            error_message: None,
            received_at: Utc::now(),
            processed_at: None,
        });
        Ok(())
    }

    async fn mark_log_processed(
        &self,
        log_id: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().await;
        if let Some(log) = inner.logs.iter_mut().find(|l| l.id == log_id) {
            log.status = LogStatus::Processed;
            log.processed_at = Some(processed_at);
        }
        Ok(())
    }

    async fn mark_log_failed(
        &self,
        log_id: Uuid,
        error: &str,
        processed_at: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().await;
        if let Some(log) = inner.logs.iter_mut().find(|l| l.id == log_id) {
            log.status = LogStatus::Failed;
            log.error_message = Some(error.to_string());
            log.processed_at = Some(processed_at);
        }
        Ok(())
    }

    async fn upsert_sale(&self, sale: &NewSale) -> Result<UpsertOutcome, PipelineError> {
        let mut inner = self.inner.lock().await;
        let existing = inner.sales.iter().position(|s| {
            s.gateway_config_id == sale.gateway_config_id
                && s.transaction_key == sale.transaction_key
        });

        let outcome = match existing {
            Some(idx) => {
                let id = inner.sales[idx].id;
                inner.sales[idx] = stored_sale(id, sale);
                UpsertOutcome::Updated(id)
            }
            None => {
                let id = Uuid::now_v7();
                inner.sales.push(stored_sale(id, sale));
                UpsertOutcome::Created(id)
            }
        };

        // Item replacement is wholesale, matching the delete-then-insert
        // semantics of the Postgres store.
        let id = outcome.id();
        inner.sale_items.insert(id, stored_items(id, sale));
        Ok(outcome)
    }

    async fn upsert_abandon(
        &self,
        abandon: &NewAbandon,
    ) -> Result<UpsertOutcome, PipelineError> {
        let mut inner = self.inner.lock().await;
        let existing = inner.abandons.iter().position(|a| {
            a.gateway_config_id == abandon.gateway_config_id
                && a.abandon_key == abandon.abandon_key
        });

        match existing {
            Some(idx) => {
                // product_name and plan_key are part of the key's semantic
                // identity and stay as first seen.
                let row = &mut inner.abandons[idx];
                row.plan_name = abandon.plan_name.clone();
                row.plan_value = abandon.plan_value;
                row.client = abandon.client.clone();
                row.gateway_updated_at = abandon.gateway_updated_at;
                Ok(UpsertOutcome::Updated(row.id))
            }
            None => {
                let id = Uuid::now_v7();
                inner.abandons.push(StoredAbandon {
                    id,
                    gateway_config_id: abandon.gateway_config_id,
                    abandon_key: abandon.abandon_key.clone(),
                    product_key: abandon.product_key.clone(),
                    product_name: abandon.product_name.clone(),
                    plan_key: abandon.plan_key.clone(),
                    plan_name: abandon.plan_name.clone(),
                    plan_value: abandon.plan_value,
                    client: abandon.client.clone(),
                    gateway_created_at: abandon.gateway_created_at,
                    gateway_updated_at: abandon.gateway_updated_at,
                });
                Ok(UpsertOutcome::Created(id))
            }
        }
    }

    async fn sale_metrics(
        &self,
        config_id: Uuid,
        product_key: &str,
        approved_status_code: i32,
    ) -> Result<SaleMetrics, PipelineError> {
        let inner = self.inner.lock().await;
        let mut total_sales = 0i64;
        let mut revenue = 0i64;
        for sale in inner
            .sales
            .iter()
            .filter(|s| s.gateway_config_id == config_id && s.product_key == product_key)
        {
            total_sales += 1;
            if sale.status_code == approved_status_code {
                revenue += sale.trans_value.value();
            }
        }
        Ok(SaleMetrics {
            total_sales,
            total_revenue: Cents::new(revenue)?,
        })
    }

    async fn count_abandons(
        &self,
        config_id: Uuid,
        product_key: &str,
    ) -> Result<i64, PipelineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .abandons
            .iter()
            .filter(|a| a.gateway_config_id == config_id && a.product_key == product_key)
            .count() as i64)
    }

    async fn upsert_product_rollup(
        &self,
        rollup: &ProductRollup,
    ) -> Result<(), PipelineError> {
        let mut inner = self.inner.lock().await;
        let existing = inner.products.iter().position(|p| {
            p.gateway_config_id == rollup.gateway_config_id
                && p.product_key_hash == rollup.product_key_hash
        });
        match existing {
            Some(idx) => inner.products[idx] = rollup.clone(),
            None => inner.products.push(rollup.clone()),
        }
        Ok(())
    }

    async fn list_sales(
        &self,
        filter: &SaleFilter,
        page: PageParams,
    ) -> Result<Page<StoredSale>, PipelineError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<StoredSale> = inner
            .sales
            .iter()
            .filter(|s| {
                filter
                    .gateway_config_id
                    .is_none_or(|id| s.gateway_config_id == id)
                    && filter.from.is_none_or(|from| s.gateway_created_at >= from)
                    && filter.to.is_none_or(|to| s.gateway_created_at <= to)
                    && filter.status_code.is_none_or(|c| s.status_code == c)
                    && filter
                        .product_key
                        .as_deref()
                        .is_none_or(|k| s.product_key == k)
                    && filter.search.as_deref().is_none_or(|q| {
                        matches_search(
                            q,
                            &[
                                s.client.name.as_deref(),
                                s.client.email.as_deref(),
                                Some(&s.product_name),
                            ],
                        )
                    })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.gateway_created_at.cmp(&a.gateway_created_at));
        Ok(paginate(rows, page))
    }

    async fn list_abandons(
        &self,
        filter: &AbandonFilter,
        page: PageParams,
    ) -> Result<Page<StoredAbandon>, PipelineError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<StoredAbandon> = inner
            .abandons
            .iter()
            .filter(|a| {
                filter
                    .gateway_config_id
                    .is_none_or(|id| a.gateway_config_id == id)
                    && filter.from.is_none_or(|from| a.gateway_created_at >= from)
                    && filter.to.is_none_or(|to| a.gateway_created_at <= to)
                    && filter
                        .product_key
                        .as_deref()
                        .is_none_or(|k| a.product_key == k)
                    && filter.search.as_deref().is_none_or(|q| {
                        matches_search(
                            q,
                            &[
                                a.client.name.as_deref(),
                                a.client.email.as_deref(),
                                Some(&a.product_name),
                            ],
                        )
                    })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.gateway_created_at.cmp(&a.gateway_created_at));
        Ok(paginate(rows, page))
    }

    async fn list_products(
        &self,
        config_id: Option<Uuid>,
        page: PageParams,
    ) -> Result<Page<ProductRollup>, PipelineError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<ProductRollup> = inner
            .products
            .iter()
            .filter(|p| config_id.is_none_or(|id| p.gateway_config_id == id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.product_key.cmp(&b.product_key));
        Ok(paginate(rows, page))
    }

    async fn get_sale(
        &self,
        config_id: Uuid,
        transaction_key: &str,
    ) -> Result<Option<StoredSale>, PipelineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sales
            .iter()
            .find(|s| s.gateway_config_id == config_id && s.transaction_key == transaction_key)
            .cloned())
    }

    async fn sale_items(&self, sale_id: Uuid) -> Result<Vec<StoredSaleItem>, PipelineError> {
        let inner = self.inner.lock().await;
        Ok(inner.sale_items.get(&sale_id).cloned().unwrap_or_default())
    }

    async fn get_abandon(
        &self,
        config_id: Uuid,
        abandon_key: &str,
    ) -> Result<Option<StoredAbandon>, PipelineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .abandons
            .iter()
            .find(|a| a.gateway_config_id == config_id && a.abandon_key == abandon_key)
            .cloned())
    }

    async fn get_product_rollup(
        &self,
        config_id: Uuid,
        product_key: &str,
    ) -> Result<Option<ProductRollup>, PipelineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .products
            .iter()
            .find(|p| p.gateway_config_id == config_id && p.product_key == product_key)
            .cloned())
    }

    async fn webhook_logs(
        &self,
        config_id: Uuid,
    ) -> Result<Vec<StoredWebhookLog>, PipelineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .logs
            .iter()
            .filter(|l| l.gateway_config_id == config_id)
            .cloned()
            .collect())
    }
}
