use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Token unknown or config inactive. The two cases are deliberately
    /// indistinguishable to the caller.
    #[error("gateway config not found")]
    ConfigNotFound,

    #[error("token belongs to gateway '{actual}', delivered on '{requested}' route")]
    GatewayMismatch { requested: String, actual: String },

    #[error("no normalizer registered for gateway '{0}'")]
    UnsupportedGateway(String),

    #[error("normalization: {0}")]
    Normalization(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
