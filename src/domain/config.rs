use {
    super::error::PipelineError,
    chrono::{DateTime, Utc},
    derive_more::Display,
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

/// External checkout platform a tenant connects to. Adding a gateway means
/// adding a variant here and registering its normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    Braip,
    Hotmart,
}

impl GatewayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Braip => "braip",
            Self::Hotmart => "hotmart",
        }
    }

    /// Gateway-native numeric status code meaning "payment approved".
    /// Only approved sales count toward product revenue.
    pub fn approved_status_code(&self) -> i32 {
        match self {
            Self::Braip => 2,
            Self::Hotmart => 1,
        }
    }
}

impl fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for GatewayKind {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_ascii_lowercase().as_str() {
            "braip" => Ok(Self::Braip),
            "hotmart" => Ok(Self::Hotmart),
            other => Err(PipelineError::Normalization(format!(
                "unknown gateway kind: {other}"
            ))),
        }
    }
}

/// Opaque per-tenant webhook credential. Globally unique and immutable once
/// issued; possession of the token is what proves tenancy.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookToken(String);

impl WebhookToken {
    pub fn new(token: impl Into<String>) -> Result<Self, PipelineError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(PipelineError::Normalization(
                "webhook token cannot be empty".into(),
            ));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Syncing,
    Completed,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SyncStatus {
    type Error = PipelineError;

    fn try_from(s: &str) -> Result<Self, <Self as TryFrom<&str>>::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "syncing" => Ok(Self::Syncing),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(PipelineError::Normalization(format!(
                "unknown sync status: {other}"
            ))),
        }
    }
}

/// Tenant-scoped connection to one external gateway. Read-only to the
/// ingestion core except for the sync tracking fields, which the pipeline
/// stamps after each delivery.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayConfig {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub kind: GatewayKind,
    #[serde(skip_serializing)]
    pub token: WebhookToken,
    pub is_active: bool,
    pub sync_status: SyncStatus,
    pub last_sync: Option<DateTime<Utc>>,
}

impl GatewayConfig {
    /// Guards a token being replayed against the wrong gateway-type route.
    pub fn matches_route(&self, route_gateway: &str) -> bool {
        self.kind.as_str().eq_ignore_ascii_case(route_gateway)
    }
}
