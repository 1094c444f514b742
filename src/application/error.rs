use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::application::cache::CacheError;
use crate::application::mapping::MappingError;
use crate::application::providers::ProviderError;
use crate::application::repos::RepoError;
use crate::infra::error::InfraError;

/// Operator-facing diagnostics carried on a response as an extension; the
/// response-logging middleware drains it, the client never sees it.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] RepoError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(RepoError::NotFound) | AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store(RepoError::InvalidInput { .. }) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Provider(_) | AppError::Mapping(_) => StatusCode::BAD_GATEWAY,
            AppError::Infra(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed user-facing strings; the cause goes to the operator log only.
    fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Store(RepoError::NotFound) | AppError::NotFound => "Resource not found",
            AppError::Store(RepoError::InvalidInput { .. }) | AppError::Validation(_) => {
                "Request could not be processed"
            }
            AppError::Store(_)
            | AppError::Provider(_)
            | AppError::Mapping(_)
            | AppError::Infra(_)
            | AppError::Unexpected(_) => "Sorry, something went wrong",
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Store(err) => Self::Store(err),
            CacheError::Provider(err) => Self::Provider(err),
            CacheError::Mapping(err) => Self::Mapping(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.presentation_message();
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, message).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_failures_present_the_generic_message() {
        let err = AppError::Provider(ProviderError::Status { status: 503 });
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.presentation_message(), "Sorry, something went wrong");

        let err = AppError::Store(RepoError::from_persistence("connection refused"));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.presentation_message(), "Sorry, something went wrong");
    }

    #[test]
    fn validation_failures_are_bad_requests() {
        let err = AppError::validation("`data` query parameter is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.presentation_message(), "Request could not be processed");
    }

    #[test]
    fn report_collects_the_source_chain() {
        let err = AppError::Store(RepoError::Integrity {
            message: "violates foreign key constraint".to_owned(),
        });
        let report =
            ErrorReport::from_error("test", StatusCode::SERVICE_UNAVAILABLE, &err);
        assert!(report.messages[0].contains("violates foreign key constraint"));
    }
}
