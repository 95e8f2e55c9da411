use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::context::build_context;
use crate::core::cancel::run_cancellable;
use crate::core::errors::{ApiError, ErrorCode, ResultExt};
use crate::knowledge::{KnowledgeStore, SimilarityResult};
use crate::llm::{AnswerRefiner, EmbeddingGateway};

pub const DEFAULT_TOP_K: usize = 3;

/// How the final answer is produced from the retrieved matches.
#[derive(Clone)]
pub enum AnswerStrategy {
    /// Rewrite the matches into an answer with a chat model.
    Refine(Arc<dyn AnswerRefiner>),
    /// Return the best match's stored response verbatim.
    Direct,
}

impl AnswerStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            AnswerStrategy::Refine(_) => "refine",
            AnswerStrategy::Direct => "direct",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InquiryAnswer {
    pub answer: String,
    pub sources: Vec<SimilarityResult>,
}

pub struct InquiryService {
    embedder: Arc<dyn EmbeddingGateway>,
    store: Arc<dyn KnowledgeStore>,
    strategy: AnswerStrategy,
    top_k: usize,
}

impl InquiryService {
    pub fn new(
        embedder: Arc<dyn EmbeddingGateway>,
        store: Arc<dyn KnowledgeStore>,
        strategy: AnswerStrategy,
    ) -> Self {
        Self {
            embedder,
            store,
            strategy,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Result<Self, ApiError> {
        if top_k == 0 {
            return Err(ApiError::invalid_parameter("top_k must be greater than 0"));
        }
        self.top_k = top_k;
        Ok(self)
    }

    /// Top matches for `question`, best first.
    pub async fn retrieve(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SimilarityResult>, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::invalid_parameter("question cannot be empty"));
        }

        let embedding = run_cancellable(
            cancel,
            "question embedding",
            self.embedder.embed_one(question),
        )
        .await
        .wrap_err_as(
            ErrorCode::InternalError,
            "failed to generate embedding for question",
        )?;
        if embedding.is_empty() {
            return Err(ApiError::new(
                ErrorCode::InternalError,
                "embedding generation returned empty result",
            ));
        }

        let matches = run_cancellable(
            cancel,
            "similarity search",
            self.store.find_similar(&embedding, self.top_k),
        )
        .await
        .wrap_err_as(
            ErrorCode::InternalError,
            "failed to find similar inquiry knowledge",
        )?;

        debug!(
            matches = matches.len(),
            best = matches.first().map(|m| m.score).unwrap_or_default(),
            "Retrieved inquiry knowledge"
        );
        Ok(matches)
    }

    pub async fn ask(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<InquiryAnswer, ApiError> {
        let sources = self.retrieve(question, cancel).await?;

        let answer = match &self.strategy {
            AnswerStrategy::Refine(refiner) => {
                let context = build_context(&sources);
                run_cancellable(cancel, "answer refinement", refiner.refine(&context))
                    .await
                    .wrap_err_as(ErrorCode::InternalError, "failed to refine answer")?
            }
            AnswerStrategy::Direct => sources
                .first()
                .map(|best| best.entry.response.clone())
                .ok_or_else(|| ApiError::not_found("no similar inquiry knowledge found"))?,
        };

        info!(
            strategy = self.strategy.label(),
            sources = sources.len(),
            "Answered inquiry"
        );
        Ok(InquiryAnswer { answer, sources })
    }
}
