use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub provider: ProviderConfig,
    pub embedding: EmbeddingConfig,
    pub ingestion: IngestionConfig,
    pub inquiry: InquiryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Deployment environment. `local` and `dev` enable debug logging.
    pub env: String,
    pub host: String,
    pub port: u16,
    /// Deadline applied to every inquiry/ingestion request.
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            env: "local".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 120,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl AppSection {
    pub fn is_development(&self) -> bool {
        matches!(self.env.as_str(), "local" | "dev")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/inquiry.db"),
            max_connections: 4,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the daily rolling log file. Stdout only when unset.
    pub dir: Option<PathBuf>,
    /// Explicit filter directive; `RUST_LOG` still wins when set.
    pub level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of an OpenAI-compatible API (OpenAI, LM Studio, Ollama `/v1`).
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            timeout_secs: 30,
            embedding_model: "text-embedding-3-small".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Vector length produced by the embedding model.
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimension: 1536 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub source_path: PathBuf,
    pub batch_size: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("mock_data/data_set.csv"),
            batch_size: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Refine retrieved matches into an answer with the chat model.
    #[default]
    Refine,
    /// Return the closest stored response verbatim.
    Direct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InquiryConfig {
    pub top_k: usize,
    pub answer_mode: AnswerMode,
}

impl Default for InquiryConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            answer_mode: AnswerMode::Refine,
        }
    }
}
