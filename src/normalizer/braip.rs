use {
    super::{EventClass, GatewayNormalizer, NormalizedEvent, classify_event},
    crate::domain::{
        abandon::NewAbandon,
        config::{GatewayConfig, GatewayKind},
        error::PipelineError,
        money::{Cents, cents_from_json},
        sale::{ClientInfo, NewSale, NewSaleItem},
    },
    chrono::{DateTime, NaiveDateTime, Utc},
    serde_json::Value,
};

/// Braip delivers sale fields under a `trans_*`/`prod_*`/`cli_*` prefix
/// scheme and abandon fields unprefixed, all nested under `data`.
pub struct BraipNormalizer;

impl GatewayNormalizer for BraipNormalizer {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Braip
    }

    fn normalize(
        &self,
        config: &GatewayConfig,
        event_name: &str,
        payload: &Value,
    ) -> Result<NormalizedEvent, PipelineError> {
        // Payloads nest the record under "data"; tolerate flat payloads.
        let data = payload.get("data").unwrap_or(payload);

        match classify_event(event_name) {
            EventClass::Sale => normalize_sale(config, data).map(NormalizedEvent::Sale),
            EventClass::Abandon => normalize_abandon(config, data).map(NormalizedEvent::Abandon),
            EventClass::Unrecognized => Ok(NormalizedEvent::Unrecognized),
        }
    }
}

fn normalize_sale(config: &GatewayConfig, data: &Value) -> Result<NewSale, PipelineError> {
    let transaction_key = require_str(data, "trans_key")?;
    let product_key = require_str(data, "prod_key")?;
    let product_name = str_field(data, "prod_name").unwrap_or_else(|| product_key.clone());

    let trans_value = require_cents(data, "trans_value")?;
    let trans_total_value = require_cents(data, "trans_total_value")?;
    let freight_value = cents_from_json(data.get("trans_freight"))?;

    let status_code = require_int(data, "trans_status_code")?;
    let status_label = str_field(data, "trans_status").unwrap_or_else(|| "unknown".to_string());
    let payment_method = int_field(data, "trans_payment").unwrap_or(0);

    let created_raw = require_str(data, "trans_createdate")?;
    let gateway_created_at = parse_gateway_date(&created_raw)?;
    let gateway_updated_at = match str_field(data, "trans_updatedate") {
        Some(raw) => parse_gateway_date(&raw)?,
        None => gateway_created_at,
    };

    let commission = match data.get("commission") {
        Some(Value::Null) | None => None,
        Some(v) => Some(v.clone()),
    };

    let items = match data.get("items").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .map(|item| normalize_item(&product_key, item))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(NewSale {
        gateway_config_id: config.id,
        transaction_key,
        product_key,
        product_name,
        plan_key: str_field(data, "plan_key"),
        plan_name: str_field(data, "plan_name"),
        trans_value,
        trans_total_value,
        freight_value,
        status_code,
        status_label,
        payment_method,
        client: extract_client(data),
        commission,
        gateway_created_at,
        gateway_updated_at,
        items,
    })
}

fn normalize_abandon(config: &GatewayConfig, data: &Value) -> Result<NewAbandon, PipelineError> {
    let product_key = require_str(data, "prod_key")?;
    let product_name = str_field(data, "prod_name").unwrap_or_else(|| product_key.clone());
    let client = extract_client(data);

    // Identity rests on the creation string exactly as delivered.
    let created_raw = require_str(data, "created_date")?;
    let abandon_key =
        NewAbandon::synthesize_key(&product_key, client.email.as_deref(), &created_raw);

    let gateway_created_at = parse_gateway_date(&created_raw)?;
    let gateway_updated_at = match str_field(data, "updated_date") {
        Some(raw) => parse_gateway_date(&raw)?,
        None => gateway_created_at,
    };

    Ok(NewAbandon {
        gateway_config_id: config.id,
        abandon_key,
        product_key,
        product_name,
        plan_key: str_field(data, "plan_key"),
        plan_name: str_field(data, "plan_name"),
        plan_value: cents_from_json(data.get("plan_value"))?,
        client,
        gateway_created_at,
        gateway_updated_at,
    })
}

/// An item missing its own product key inherits the parent sale's; missing
/// quantity defaults to 1, missing type code to 0.
fn normalize_item(parent_product_key: &str, item: &Value) -> Result<NewSaleItem, PipelineError> {
    let unit_value = require_cents(item, "value")?;
    Ok(NewSaleItem {
        plan_key: str_field(item, "plan_key"),
        plan_name: str_field(item, "plan_name"),
        unit_value,
        quantity: int_field(item, "amount").unwrap_or(1),
        product_key: str_field(item, "prod_key")
            .unwrap_or_else(|| parent_product_key.to_string()),
        product_type: int_field(item, "prod_type").unwrap_or(0),
        is_main: item.get("main").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn extract_client(data: &Value) -> ClientInfo {
    ClientInfo {
        name: str_field(data, "cli_name"),
        email: str_field(data, "cli_email"),
        phone: str_field(data, "cli_cel"),
        document: str_field(data, "cli_document"),
        address: str_field(data, "cli_address"),
        city: str_field(data, "cli_address_city"),
        state: str_field(data, "cli_address_state"),
        zip: str_field(data, "cli_address_zipcode"),
    }
}

/// Optional string field. Empty/whitespace values collapse to `None`, so
/// storage can tell "not provided" from "empty".
fn str_field(data: &Value, key: &str) -> Option<String> {
    let s = data.get(key)?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn require_str(data: &Value, key: &str) -> Result<String, PipelineError> {
    str_field(data, key)
        .ok_or_else(|| PipelineError::Normalization(format!("payload missing required '{key}'")))
}

fn int_field(data: &Value, key: &str) -> Option<i32> {
    match data.get(key)? {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn require_int(data: &Value, key: &str) -> Result<i32, PipelineError> {
    int_field(data, key)
        .ok_or_else(|| PipelineError::Normalization(format!("payload missing required '{key}'")))
}

fn require_cents(data: &Value, key: &str) -> Result<Cents, PipelineError> {
    cents_from_json(data.get(key))?
        .ok_or_else(|| PipelineError::Normalization(format!("payload missing required '{key}'")))
}

/// Braip mixes RFC 3339 and bare "YYYY-MM-DD HH:MM:SS" strings; bare
/// timestamps are taken as UTC.
fn parse_gateway_date(raw: &str) -> Result<DateTime<Utc>, PipelineError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    Err(PipelineError::Normalization(format!(
        "unparseable gateway date: '{raw}'"
    )))
}

#[cfg(test)]
mod tests {
    use {super::*, crate::domain::config::{SyncStatus, WebhookToken}, uuid::Uuid};

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            id: Uuid::now_v7(),
            tenant_id: Uuid::now_v7(),
            kind: GatewayKind::Braip,
            token: WebhookToken::new("tok_test").unwrap(),
            is_active: true,
            sync_status: SyncStatus::Pending,
            last_sync: None,
        }
    }

    fn sale_data() -> Value {
        serde_json::json!({
            "trans_key": "T1",
            "prod_key": "P1",
            "prod_name": "Course",
            "trans_value": 19.9,
            "trans_total_value": 199.9,
            "trans_status": "approved",
            "trans_status_code": 2,
            "trans_payment": 3,
            "cli_name": "Ana",
            "cli_email": "ana@x.com",
            "trans_createdate": "2024-01-01T10:00:00Z",
            "trans_updatedate": "2024-01-01T10:00:00Z"
        })
    }

    #[test]
    fn sale_money_lands_in_cents() {
        let config = test_config();
        let payload = serde_json::json!({ "data": sale_data() });
        let normalized = BraipNormalizer
            .normalize(&config, "sale_approved", &payload)
            .unwrap();
        let NormalizedEvent::Sale(sale) = normalized else {
            panic!("expected a sale");
        };
        assert_eq!(sale.trans_value.value(), 1990);
        assert_eq!(sale.trans_total_value.value(), 19990);
        assert_eq!(sale.client.name.as_deref(), Some("Ana"));
        assert_eq!(sale.client.phone, None);
    }

    #[test]
    fn missing_transaction_key_is_a_normalization_error() {
        let config = test_config();
        let mut data = sale_data();
        data.as_object_mut().unwrap().remove("trans_key");
        let payload = serde_json::json!({ "data": data });
        let err = BraipNormalizer
            .normalize(&config, "sale_approved", &payload)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Normalization(_)));
    }

    #[test]
    fn empty_optional_fields_become_none() {
        let config = test_config();
        let mut data = sale_data();
        data.as_object_mut()
            .unwrap()
            .insert("cli_cel".into(), serde_json::json!("  "));
        let payload = serde_json::json!({ "data": data });
        let NormalizedEvent::Sale(sale) = BraipNormalizer
            .normalize(&config, "sale_approved", &payload)
            .unwrap()
        else {
            panic!("expected a sale");
        };
        assert_eq!(sale.client.phone, None);
    }

    #[test]
    fn item_defaults_and_inheritance() {
        let config = test_config();
        let mut data = sale_data();
        data.as_object_mut().unwrap().insert(
            "items".into(),
            serde_json::json!([
                { "value": 10.0, "plan_key": "PL1", "prod_key": "P2", "amount": 3, "prod_type": 1, "main": true },
                { "value": 5.5 }
            ]),
        );
        let payload = serde_json::json!({ "data": data });
        let NormalizedEvent::Sale(sale) = BraipNormalizer
            .normalize(&config, "sale_approved", &payload)
            .unwrap()
        else {
            panic!("expected a sale");
        };
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.items[0].product_key, "P2");
        assert_eq!(sale.items[0].quantity, 3);
        assert!(sale.items[0].is_main);
        // Second item inherits the parent product key and the defaults.
        assert_eq!(sale.items[1].product_key, "P1");
        assert_eq!(sale.items[1].quantity, 1);
        assert_eq!(sale.items[1].product_type, 0);
        assert_eq!(sale.items[1].unit_value.value(), 550);
        assert!(!sale.items[1].is_main);
    }

    #[test]
    fn abandon_updated_falls_back_to_created() {
        let config = test_config();
        let payload = serde_json::json!({
            "data": {
                "prod_key": "P1",
                "prod_name": "Course",
                "cli_email": "ana@x.com",
                "created_date": "2024-01-01 10:00:00"
            }
        });
        let NormalizedEvent::Abandon(abandon) = BraipNormalizer
            .normalize(&config, "checkout_abandon", &payload)
            .unwrap()
        else {
            panic!("expected an abandon");
        };
        assert_eq!(abandon.gateway_updated_at, abandon.gateway_created_at);
        assert_eq!(abandon.abandon_key, "P1:ana@x.com:2024-01-01 10:00:00");
    }

    #[test]
    fn unrecognized_event_is_not_an_error() {
        let config = test_config();
        let payload = serde_json::json!({ "data": {} });
        let normalized = BraipNormalizer
            .normalize(&config, "plan_changed", &payload)
            .unwrap();
        assert!(matches!(normalized, NormalizedEvent::Unrecognized));
    }

    #[test]
    fn bare_datetime_parses_as_utc() {
        let dt = parse_gateway_date("2024-06-30 23:59:59").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-06-30T23:59:59+00:00");
    }
}
