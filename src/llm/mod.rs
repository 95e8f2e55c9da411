pub mod embedding;
pub mod json;
pub mod openai;
pub mod provider;
pub mod refiner;
pub mod types;

pub use embedding::{EmbeddingGateway, ProviderEmbeddingGateway};
pub use openai::OpenAiCompatibleProvider;
pub use provider::LlmProvider;
pub use refiner::{AnswerRefiner, LlmAnswerRefiner};
pub use types::{ChatMessage, ChatRequest};
