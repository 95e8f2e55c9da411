pub mod service;
pub mod types;
pub mod validation;

pub use service::ConfigService;
pub use types::{
    AnswerMode, AppConfig, AppSection, DatabaseConfig, EmbeddingConfig, IngestionConfig,
    InquiryConfig, LoggingConfig, ProviderConfig,
};
