use {
    super::money::Cents,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// Buyer contact captured from gateway payloads. Gateways omit fields
/// inconsistently; absent means "not provided", never empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientInfo {
    #[sqlx(rename = "client_name")]
    pub name: Option<String>,
    #[sqlx(rename = "client_email")]
    pub email: Option<String>,
    #[sqlx(rename = "client_phone")]
    pub phone: Option<String>,
    #[sqlx(rename = "client_document")]
    pub document: Option<String>,
    #[sqlx(rename = "client_address")]
    pub address: Option<String>,
    #[sqlx(rename = "client_city")]
    pub city: Option<String>,
    #[sqlx(rename = "client_state")]
    pub state: Option<String>,
    #[sqlx(rename = "client_zip")]
    pub zip: Option<String>,
}

/// Canonical sale produced by a normalizer, keyed by the gateway's own
/// idempotency key. Timestamps come from the gateway clock, not ingestion
/// time.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub gateway_config_id: Uuid,
    pub transaction_key: String,
    pub product_key: String,
    pub product_name: String,
    pub plan_key: Option<String>,
    pub plan_name: Option<String>,
    pub trans_value: Cents,
    pub trans_total_value: Cents,
    pub freight_value: Option<Cents>,
    pub status_code: i32,
    pub status_label: String,
    pub payment_method: i32,
    pub client: ClientInfo,
    pub commission: Option<serde_json::Value>,
    pub gateway_created_at: DateTime<Utc>,
    pub gateway_updated_at: DateTime<Utc>,
    pub items: Vec<NewSaleItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSaleItem {
    pub plan_key: Option<String>,
    pub plan_name: Option<String>,
    pub unit_value: Cents,
    pub quantity: i32,
    pub product_key: String,
    pub product_type: i32,
    pub is_main: bool,
}

/// Full sale row as stored (for reads).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredSale {
    pub id: Uuid,
    pub gateway_config_id: Uuid,
    pub transaction_key: String,
    pub product_key: String,
    pub product_name: String,
    pub plan_key: Option<String>,
    pub plan_name: Option<String>,
    pub trans_value: Cents,
    pub trans_total_value: Cents,
    pub freight_value: Option<Cents>,
    pub status_code: i32,
    pub status_label: String,
    pub payment_method: i32,
    #[sqlx(flatten)]
    pub client: ClientInfo,
    pub commission: Option<serde_json::Value>,
    pub gateway_created_at: DateTime<Utc>,
    pub gateway_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredSaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub plan_key: Option<String>,
    pub plan_name: Option<String>,
    pub unit_value: Cents,
    pub quantity: i32,
    pub product_key: String,
    pub product_type: i32,
    pub is_main: bool,
}

/// Outcome of an idempotent upsert. Re-delivery of a known natural key
/// yields `Updated`, never a second row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(Uuid),
    Updated(Uuid),
}

impl UpsertOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Created(id) | Self::Updated(id) => *id,
        }
    }
}

/// Filters for the paginated sale listing consumed by the analytics layer.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub gateway_config_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status_code: Option<i32>,
    pub product_key: Option<String>,
    pub search: Option<String>,
}
