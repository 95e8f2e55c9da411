use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Stable failure codes exposed to the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    InvalidParameter,
    NotFound,
    ConstraintError,
    ProviderError,
    InternalError,
    Cancelled,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidParameter => "InvalidParameter",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::ConstraintError => "ConstraintError",
            ErrorCode::ProviderError => "ProviderError",
            ErrorCode::InternalError => "InternalError",
            ErrorCode::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error carrying a code, a short message and the causal chain below it.
///
/// Each layer wraps the error it received with its own message. `wrap` keeps
/// the code of the inner error, `wrap_as` re-codes it; the inner error stays
/// reachable through [`StdError::source`] either way.
#[derive(Debug, Error)]
#[error("{message}{}", render_source(.source))]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    #[source]
    source: Option<BoxError>,
}

fn render_source(source: &Option<BoxError>) -> String {
    match source {
        Some(inner) => format!(": {}", inner),
        None => String::new(),
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParameter, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConstraintError, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Cancelled, message)
    }

    pub fn internal<E: fmt::Display>(err: E) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    pub fn provider<E: fmt::Display>(err: E) -> Self {
        Self::new(ErrorCode::ProviderError, err.to_string())
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn wrap(self, message: impl Into<String>) -> Self {
        let code = self.code;
        self.wrap_as(code, message)
    }

    /// Re-codes to `code`, except that a cancelled error stays `Cancelled`.
    pub fn wrap_as(self, code: ErrorCode, message: impl Into<String>) -> Self {
        let code = if self.code == ErrorCode::Cancelled {
            ErrorCode::Cancelled
        } else {
            code
        };
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(self)),
        }
    }

    /// True when this error or any `ApiError` in its cause chain has `code`.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        let mut current: Option<&ApiError> = Some(self);
        while let Some(err) = current {
            if err.code == code {
                return true;
            }
            current = err
                .source
                .as_deref()
                .and_then(|inner| inner.downcast_ref::<ApiError>());
        }
        false
    }
}

pub trait ResultExt<T> {
    fn wrap_err(self, message: &str) -> Result<T, ApiError>;
    fn wrap_err_as(self, code: ErrorCode, message: &str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for Result<T, ApiError> {
    fn wrap_err(self, message: &str) -> Result<T, ApiError> {
        self.map_err(|err| err.wrap(message))
    }

    fn wrap_err_as(self, code: ErrorCode, message: &str) -> Result<T, ApiError> {
        self.map_err(|err| err.wrap_as(code, message))
    }
}
