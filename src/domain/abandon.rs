use {
    super::money::Cents,
    super::sale::ClientInfo,
    chrono::{DateTime, Utc},
    serde::Serialize,
    uuid::Uuid,
};

/// Canonical abandoned-checkout record. Abandon events carry no native
/// transaction id, so identity is synthesized from product, contact and the
/// raw creation string (see [`NewAbandon::synthesize_key`]).
#[derive(Debug, Clone)]
pub struct NewAbandon {
    pub gateway_config_id: Uuid,
    pub abandon_key: String,
    pub product_key: String,
    pub product_name: String,
    pub plan_key: Option<String>,
    pub plan_name: Option<String>,
    pub plan_value: Option<Cents>,
    pub client: ClientInfo,
    pub gateway_created_at: DateTime<Utc>,
    pub gateway_updated_at: DateTime<Utc>,
}

impl NewAbandon {
    /// The creation string participates as delivered, unparsed: two
    /// deliveries that format the same instant differently are treated as
    /// distinct carts.
    pub fn synthesize_key(product_key: &str, email: Option<&str>, raw_created: &str) -> String {
        format!(
            "{}:{}:{}",
            product_key,
            email.unwrap_or("unknown"),
            raw_created
        )
    }
}

/// Full abandon row as stored (for reads).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredAbandon {
    pub id: Uuid,
    pub gateway_config_id: Uuid,
    pub abandon_key: String,
    pub product_key: String,
    pub product_name: String,
    pub plan_key: Option<String>,
    pub plan_name: Option<String>,
    pub plan_value: Option<Cents>,
    #[sqlx(flatten)]
    pub client: ClientInfo,
    pub gateway_created_at: DateTime<Utc>,
    pub gateway_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AbandonFilter {
    pub gateway_config_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub product_key: Option<String>,
    pub search: Option<String>,
}
