//! Error types for marsdash-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marsdash_core::{CoreError, ErrorCode, ErrorSeverity};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e.code() {
                ErrorCode::InvalidRange | ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
                ErrorCode::NoTransactions => StatusCode::NOT_FOUND,
                ErrorCode::UpstreamQuery => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let ApiError::Core(error) = &self;
        match error.severity() {
            ErrorSeverity::Error => log::error!("{} {}", status, error),
            ErrorSeverity::Warning => log::warn!("{} {}", status, error),
            ErrorSeverity::Info => log::debug!("{} {}", status, error),
        }
        (status, Json(error.to_details())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::invalid_range("x"), StatusCode::BAD_REQUEST),
            (CoreError::validation("format", "x"), StatusCode::BAD_REQUEST),
            (CoreError::NoTransactions, StatusCode::NOT_FOUND),
            (
                CoreError::UpstreamQuery {
                    query: "q".to_string(),
                    message: "m".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (CoreError::NotLoaded, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }
}
