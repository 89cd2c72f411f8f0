// Error taxonomy shared by services and handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadInput(String),

    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already data for the minute")]
    RateLimited,

    #[error("query deadline exceeded")]
    DeadlineExceeded,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn bad_input(msg: impl Into<String>) -> Self {
        AppError::BadInput(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadInput(_) | AppError::InvalidResolution(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a caller. Internal causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(err) = &self {
            tracing::error!("internal error: {:#}", err);
        }

        (self.status(), self.public_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::bad_input("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InvalidResolution("day".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("app".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::DeadlineExceeded.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let err: AppError = anyhow::anyhow!("SELECT * FROM secret failed").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn test_invalid_resolution_message() {
        let err = AppError::InvalidResolution("day".into());
        assert_eq!(err.public_message(), "invalid resolution: day");
    }
}
