use std::sync::Arc;

use async_trait::async_trait;

use super::provider::LlmProvider;
use crate::core::errors::{ApiError, ErrorCode, ResultExt};
use crate::knowledge::Embedding;

/// Text-to-vector capability. Implementations must be safe to call
/// concurrently and never retry on their own.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    async fn embed_one(&self, text: &str) -> Result<Embedding, ApiError>;

    /// One vector per input, in input order. The length is not verified here.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, ApiError>;
}

pub struct ProviderEmbeddingGateway {
    provider: Arc<dyn LlmProvider>,
    model_id: String,
}

impl ProviderEmbeddingGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, model_id: impl Into<String>) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl EmbeddingGateway for ProviderEmbeddingGateway {
    async fn embed_one(&self, text: &str) -> Result<Embedding, ApiError> {
        let mut vectors = self
            .provider
            .embed(&[text.to_string()], &self.model_id)
            .await
            .wrap_err_as(ErrorCode::ProviderError, "failed to embed string")?;

        match vectors.pop() {
            Some(vector) if !vector.is_empty() || text.is_empty() => Ok(vector),
            _ => Err(ApiError::new(
                ErrorCode::ProviderError,
                format!("{} returned no embedding", self.provider.name()),
            )),
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, ApiError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.provider
            .embed(texts, &self.model_id)
            .await
            .wrap_err_as(ErrorCode::ProviderError, "failed to embed strings")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::llm::types::ChatRequest;

    struct StubProvider {
        reply: Result<Vec<Vec<f32>>, ErrorCode>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn chat(&self, _request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
            Err(ApiError::provider("chat unsupported"))
        }

        async fn embed(
            &self,
            _inputs: &[String],
            _model_id: &str,
        ) -> Result<Vec<Vec<f32>>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .map_err(|code| ApiError::new(code, "upstream unavailable"))
        }
    }

    fn stub_gateway(
        reply: Result<Vec<Vec<f32>>, ErrorCode>,
    ) -> (ProviderEmbeddingGateway, Arc<StubProvider>) {
        let provider = Arc::new(StubProvider {
            reply,
            calls: AtomicUsize::new(0),
        });
        (
            ProviderEmbeddingGateway::new(provider.clone(), "text-embedding-3-small"),
            provider,
        )
    }

    #[tokio::test]
    async fn embed_one_returns_the_single_vector() {
        let (gateway, _) = stub_gateway(Ok(vec![vec![0.1, 0.2]]));
        assert_eq!(gateway.embed_one("hello").await.unwrap(), vec![0.1, 0.2]);
    }

    #[tokio::test]
    async fn empty_provider_result_is_a_provider_error() {
        let (gateway, _) = stub_gateway(Ok(vec![]));
        let err = gateway.embed_one("hello").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderError);

        let (gateway, _) = stub_gateway(Ok(vec![vec![]]));
        let err = gateway.embed_one("hello").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderError);
    }

    #[tokio::test]
    async fn provider_failures_are_wrapped_with_context() {
        let (gateway, _) = stub_gateway(Err(ErrorCode::InternalError));
        let err = gateway.embed_one("hello").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderError);
        assert_eq!(err.to_string(), "failed to embed string: upstream unavailable");
        assert!(err.has_code(ErrorCode::InternalError));
    }

    #[tokio::test]
    async fn empty_batch_skips_the_provider() {
        let (gateway, provider) = stub_gateway(Ok(vec![vec![1.0]]));
        assert!(gateway.embed_batch(&[]).await.unwrap().is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        let batch = gateway.embed_batch(&["a".to_string()]).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
