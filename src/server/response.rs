//! Standard response envelope: `{"trid", "code", "result"}`.
//!
//! On success `code` is the four-digit HTTP status, on failure it is the
//! error code name and `result` is `{"msg": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::middleware::TrId;
use crate::core::errors::{ApiError, ErrorCode};
use crate::users::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub trid: String,
    pub code: String,
    pub result: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResult {
    pub msg: String,
}

pub struct Reply<T> {
    trid: TrId,
    status: StatusCode,
    result: T,
}

impl<T: Serialize> Reply<T> {
    pub fn ok(trid: TrId, result: T) -> Self {
        Self::with_status(trid, StatusCode::OK, result)
    }

    pub fn created(trid: TrId, result: T) -> Self {
        Self::with_status(trid, StatusCode::CREATED, result)
    }

    pub fn with_status(trid: TrId, status: StatusCode, result: T) -> Self {
        Self {
            trid,
            status,
            result,
        }
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            trid: self.trid.to_string(),
            code: format!("{:04}", self.status.as_u16()),
            result: self.result,
        };
        (self.status, Json(body)).into_response()
    }
}

/// An [`ApiError`] bound to the transaction id of the request that failed.
#[derive(Debug)]
pub struct HttpError {
    trid: TrId,
    error: ApiError,
}

impl HttpError {
    pub fn new(trid: TrId, error: ApiError) -> Self {
        Self { trid, error }
    }
}

pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidParameter => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ConstraintError => StatusCode::CONFLICT,
        ErrorCode::ProviderError => StatusCode::BAD_GATEWAY,
        ErrorCode::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let code = self.error.code();
        let status = status_for(code);
        if status.is_server_error() {
            tracing::error!(
                trid = %self.trid,
                code = %code,
                error = %self.error,
                "Request failed"
            );
        } else {
            tracing::warn!(
                trid = %self.trid,
                code = %code,
                error = %self.error,
                "Request rejected"
            );
        }

        let body = Envelope {
            trid: self.trid.to_string(),
            code: code.as_str().to_string(),
            result: ErrorResult {
                msg: self.error.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

pub trait WithTrId<T> {
    fn with_trid(self, trid: &TrId) -> Result<T, HttpError>;
}

impl<T> WithTrId<T> for Result<T, ApiError> {
    fn with_trid(self, trid: &TrId) -> Result<T, HttpError> {
        self.map_err(|error| HttpError::new(trid.clone(), error))
    }
}

/// Raw `?offset=&limit=` values; anything unparseable is treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    /// Negative offsets become 0; a limit outside `1..=MAX_PAGE_LIMIT` becomes
    /// the default.
    pub fn resolve(&self) -> (usize, usize) {
        let parse = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|v| v.trim().parse::<i64>().ok())
        };

        let offset = parse(&self.offset).unwrap_or(0).max(0) as usize;
        let limit = match parse(&self.limit) {
            Some(limit) if (1..=MAX_PAGE_LIMIT as i64).contains(&limit) => limit as usize,
            _ => DEFAULT_PAGE_LIMIT,
        };
        (offset, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(offset: Option<&str>, limit: Option<&str>) -> PageParams {
        PageParams {
            offset: offset.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(params(None, None).resolve(), (0, 50));
        assert_eq!(params(Some("10"), Some("20")).resolve(), (10, 20));
        assert_eq!(params(Some("-3"), Some("0")).resolve(), (0, 50));
        assert_eq!(params(Some("abc"), Some("201")).resolve(), (0, 50));
        assert_eq!(params(None, Some("200")).resolve(), (0, 200));
    }

    #[test]
    fn every_code_maps_to_a_status() {
        assert_eq!(status_for(ErrorCode::InvalidParameter), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::ConstraintError), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::ProviderError), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorCode::Cancelled), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorCode::InternalError), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
