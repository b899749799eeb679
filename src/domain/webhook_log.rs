use {
    super::error::PipelineError,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Received,
    Processed,
    Failed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for LogStatus {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, PipelineError> {
        match s {
            "received" => Ok(Self::Received),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            other => Err(PipelineError::Normalization(format!(
                "unknown webhook log status: {other}"
            ))),
        }
    }
}

/// Audit row created the moment a webhook is attributed to a config,
/// before any processing. Purely observability; nothing reads it back
/// on the ingestion path.
#[derive(Debug, Clone)]
pub struct NewWebhookLog {
    pub id: Uuid,
    pub gateway_config_id: Uuid,
    pub event_name: String,
    pub payload: serde_json::Value,
}

impl NewWebhookLog {
    pub fn new(gateway_config_id: Uuid, event_name: &str, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            gateway_config_id,
            event_name: event_name.to_string(),
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredWebhookLog {
    pub id: Uuid,
    pub gateway_config_id: Uuid,
    pub event_name: String,
    pub payload: serde_json::Value,
    pub status: LogStatus,
    pub error_message: Option<String>,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}
