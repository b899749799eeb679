use {
    super::money::Cents,
    serde::Serialize,
    std::hash::{DefaultHasher, Hash, Hasher},
    uuid::Uuid,
};

/// Per-tenant, per-gateway product rollup. Fully derived: recomputed from
/// the underlying sale/abandon rows after every mutation, never patched
/// incrementally.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductRollup {
    pub gateway_config_id: Uuid,
    pub product_key: String,
    pub product_key_hash: i64,
    pub product_name: String,
    pub total_sales: i64,
    pub total_revenue: Cents,
    pub total_abandons: i64,
}

/// Counts and approved-only revenue recomputed from committed sale rows.
#[derive(Debug, Clone, Copy)]
pub struct SaleMetrics {
    pub total_sales: i64,
    pub total_revenue: Cents,
}

/// Stable 64-bit hash of the product key; part of the rollup storage key.
pub fn product_key_hash(product_key: &str) -> i64 {
    let mut hasher = DefaultHasher::new();
    product_key.hash(&mut hasher);
    hasher.finish() as i64
}
