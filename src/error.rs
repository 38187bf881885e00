//! Error Taxonomy
//!
//! Every public search operation returns `Result<_, SearchError>`. Validation
//! problems are reported with the offending input; store failures are carried
//! through untouched so the caller sees the store's own message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The search field contains characters outside the allowed set.
    #[error("Invalid Search Field {0}")]
    InvalidField(String),

    /// `filters` was supplied as text that is not valid JSON, or has a shape
    /// the filter language does not understand.
    #[error("Invalid filters: {0}")]
    InvalidFilters(String),

    /// The request named a custom query that is not registered.
    #[error("Unknown search query: {0}")]
    UnknownQuery(String),

    /// Failure reported by the record store. Never retried here.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// JSON body returned for failed requests.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub exc_type: &'static str,
    pub message: String,
}

impl SearchError {
    pub fn status(&self) -> StatusCode {
        match self {
            SearchError::InvalidField(_) => StatusCode::EXPECTATION_FAILED,
            SearchError::InvalidFilters(_) => StatusCode::BAD_REQUEST,
            SearchError::UnknownQuery(_) => StatusCode::NOT_FOUND,
            SearchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn exc_type(&self) -> &'static str {
        match self {
            SearchError::InvalidField(_) => "DataError",
            SearchError::InvalidFilters(_) => "ValidationError",
            SearchError::UnknownQuery(_) => "DoesNotExistError",
            SearchError::Store(_) => "StoreError",
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            SearchError::Store(e) => {
                tracing::error!("Record store failure: {:#}", e);
                "Record store request failed".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                exc_type: self.exc_type(),
                message,
            }),
        )
            .into_response()
    }
}
