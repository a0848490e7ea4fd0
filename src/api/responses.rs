//! JSON envelopes of the API
//!
//! Every body carries a boolean `result`. Failures carry an `error` message
//! instead of payload fields.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::output::Statistics;
use crate::search::{SearchHit, SearchResponse};
use crate::storage::StorageError;
use crate::{IndexError, JobError, SearchError};

/// Body of a request that succeeded with nothing to return
#[derive(Debug, Serialize)]
pub struct Ack {
    pub result: bool,
}

impl Ack {
    pub fn ok() -> Json<Self> {
        Json(Self { result: true })
    }
}

#[derive(Debug, Serialize)]
pub struct StatisticsBody {
    pub result: bool,
    pub statistics: Statistics,
}

#[derive(Debug, Serialize)]
pub struct SearchBody {
    pub result: bool,
    pub count: usize,
    pub data: Vec<SearchHit>,
}

impl From<SearchResponse> for SearchBody {
    fn from(response: SearchResponse) -> Self {
        Self {
            result: true,
            count: response.count,
            data: response.data,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    result: bool,
    error: String,
}

/// A failed request
///
/// `BadRequest` messages are shown to the caller as is. `Internal` details
/// are logged and replaced by a generic message.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(detail) => {
                tracing::error!("Request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            result: false,
            error,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::AlreadyRunning | JobError::NotRunning => Self::BadRequest(e.to_string()),
            JobError::InvalidSite { .. } | JobError::Storage(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::InvalidUrl(_) | IndexError::SiteNotConfigured(_) | IndexError::Fetch(_) => {
                Self::BadRequest(e.to_string())
            }
            IndexError::Storage(_) | IndexError::Task(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Storage(_) => Self::Internal(e.to_string()),
            SearchError::EmptyQuery | SearchError::NoResults | SearchError::UnknownSite(_) => {
                Self::BadRequest(e.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::Internal(e.to_string())
    }
}
