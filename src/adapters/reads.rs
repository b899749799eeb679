//! Read-only listings consumed by the analytics layer. Correctness rests
//! entirely on the invariants the ingestion pipeline maintains.

use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::{
            abandon::{AbandonFilter, StoredAbandon},
            product::ProductRollup,
            sale::{SaleFilter, StoredSale},
            store::{Page, PageParams, Store},
        },
    },
    axum::{
        Json,
        extract::{Query, State},
    },
    chrono::{DateTime, Utc},
    serde::Deserialize,
    uuid::Uuid,
};

#[derive(Debug, Deserialize)]
pub struct SaleListQuery {
    pub gateway_config_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status_code: Option<i32>,
    pub product_key: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list_sales<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<SaleListQuery>,
) -> Result<Json<Page<StoredSale>>, ApiError> {
    let filter = SaleFilter {
        gateway_config_id: query.gateway_config_id,
        from: query.from,
        to: query.to,
        status_code: query.status_code,
        product_key: query.product_key,
        search: query.search,
    };
    let page = PageParams::new(query.page, query.per_page);
    Ok(Json(state.store.list_sales(&filter, page).await?))
}

#[derive(Debug, Deserialize)]
pub struct AbandonListQuery {
    pub gateway_config_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub product_key: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list_abandons<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<AbandonListQuery>,
) -> Result<Json<Page<StoredAbandon>>, ApiError> {
    let filter = AbandonFilter {
        gateway_config_id: query.gateway_config_id,
        from: query.from,
        to: query.to,
        product_key: query.product_key,
        search: query.search,
    };
    let page = PageParams::new(query.page, query.per_page);
    Ok(Json(state.store.list_abandons(&filter, page).await?))
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub gateway_config_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list_products<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Page<ProductRollup>>, ApiError> {
    let page = PageParams::new(query.page, query.per_page);
    Ok(Json(
        state
            .store
            .list_products(query.gateway_config_id, page)
            .await?,
    ))
}
