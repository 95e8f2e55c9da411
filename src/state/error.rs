use thiserror::Error;

use crate::core::errors::ApiError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to open database: {0}")]
    Database(#[source] ApiError),

    #[error("Failed to initialize LLM provider: {0}")]
    Provider(#[source] ApiError),

    #[error("Failed to configure {component}: {source}")]
    Component {
        component: &'static str,
        #[source]
        source: ApiError,
    },
}
