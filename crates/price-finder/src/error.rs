use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pricing_common::error::CommonError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    #[error("only PDF or JSON table files are allowed, got: {0}")]
    UnsupportedFile(String),

    #[error("document error: {0}")]
    Document(String),

    #[error("no pricing data found in document")]
    NoPricingData,

    #[error("upload error: {0}")]
    Upload(String),

    #[error("upload too large: {0}")]
    UploadTooLarge(String),

    #[error("{0} must not be empty")]
    EmptyQuery(&'static str),

    #[error("item '{0}' not found in pricing table")]
    NotFound(String),

    #[error("worker error: {0}")]
    Worker(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFile(_)
            | AppError::Document(_)
            | AppError::NoPricingData
            | AppError::Upload(_)
            | AppError::EmptyQuery(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Common(CommonError::RedisUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Common(_) | AppError::Config(_) | AppError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = serde_json::json!({ "detail": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(AppError::NoPricingData.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::EmptyQuery("item_name").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("cimento".to_string()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn store_outage_maps_to_503() {
        let err: AppError = CommonError::RedisUnavailable.into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "redis unavailable");
    }

    #[test]
    fn messages_name_the_offending_input() {
        assert_eq!(
            AppError::NotFound("Cimento".to_string()).to_string(),
            "item 'Cimento' not found in pricing table"
        );
        assert_eq!(
            AppError::EmptyQuery("item_name").to_string(),
            "item_name must not be empty"
        );
    }
}
