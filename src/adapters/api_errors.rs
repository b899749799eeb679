use {
    crate::domain::error::PipelineError,
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
};

/// Newtype so the domain error can carry an axum response mapping without
/// the domain layer knowing about HTTP.
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            // No detail leaked: unknown and inactive tokens read the same.
            PipelineError::ConfigNotFound => {
                (StatusCode::NOT_FOUND, "unknown webhook token".to_string())
            }
            PipelineError::GatewayMismatch { .. } => {
                (StatusCode::BAD_REQUEST, self.0.to_string())
            }
            PipelineError::Normalization(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg.clone())
            }
            PipelineError::UnsupportedGateway(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.0.to_string())
            }
            PipelineError::Storage(err) => {
                tracing::error!("storage error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            PipelineError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        let body = serde_json::json!({
            "success": false,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}
