use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use seasongate_core::error::{ApiError, ErrorEnvelope};
use seasongate_db::StoreError;
use seasongate_metadata::MetadataError;

/// Newtype wrapper so we can implement `IntoResponse` in this crate.
#[derive(Debug)]
pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = ErrorEnvelope::from(&self.0);
        (status, Json(envelope)).into_response()
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

// Resolution failures of any kind surface as a generic server error.
impl From<MetadataError> for AppError {
    fn from(e: MetadataError) -> Self {
        Self(ApiError::Internal(e.to_string()))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        Self(ApiError::Internal(e.to_string()))
    }
}
