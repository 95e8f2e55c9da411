use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::chat::BasicChatService;
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::{AnswerMode, AppConfig};
use crate::core::db;
use crate::ingest::IngestionPipeline;
use crate::inquiry::{AnswerStrategy, InquiryService};
use crate::knowledge::{KnowledgeStore, SqliteKnowledgeStore};
use crate::llm::{
    EmbeddingGateway, LlmAnswerRefiner, LlmProvider, OpenAiCompatibleProvider,
    ProviderEmbeddingGateway,
};
use crate::users::{SqliteUserStore, UserService};

pub mod error;

use error::InitializationError;

/// Composition root shared by every route.
///
/// Holds the configured services plus the server-wide shutdown token that
/// every request token is derived from.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub provider: Arc<dyn LlmProvider>,
    pub knowledge: Arc<dyn KnowledgeStore>,
    pub users: Arc<UserService>,
    pub inquiry: Arc<InquiryService>,
    pub chat: Arc<BasicChatService>,
    pub ingestion: Arc<IngestionPipeline>,
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Opens the database and binds the OpenAI-compatible provider named in
    /// `config`.
    pub async fn initialize(
        config: AppConfig,
        shutdown: CancellationToken,
    ) -> Result<Arc<Self>, InitializationError> {
        let pool = db::connect(&config.database.path, config.database.max_connections)
            .await
            .map_err(InitializationError::Database)?;
        let provider = OpenAiCompatibleProvider::from_config(&config.provider)
            .map_err(InitializationError::Provider)?;

        Self::from_parts(config, pool, Arc::new(provider), Arc::new(SystemClock), shutdown)
    }

    pub fn from_parts(
        config: AppConfig,
        pool: SqlitePool,
        provider: Arc<dyn LlmProvider>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Result<Arc<Self>, InitializationError> {
        let knowledge: Arc<dyn KnowledgeStore> = Arc::new(
            SqliteKnowledgeStore::new(pool.clone()).with_dimension(config.embedding.dimension),
        );
        let embedder: Arc<dyn EmbeddingGateway> = Arc::new(ProviderEmbeddingGateway::new(
            provider.clone(),
            config.provider.embedding_model.clone(),
        ));

        let strategy = match config.inquiry.answer_mode {
            AnswerMode::Refine => AnswerStrategy::Refine(Arc::new(LlmAnswerRefiner::new(
                provider.clone(),
                config.provider.chat_model.clone(),
                config.provider.temperature,
            ))),
            AnswerMode::Direct => AnswerStrategy::Direct,
        };

        let inquiry = InquiryService::new(embedder.clone(), knowledge.clone(), strategy)
            .with_top_k(config.inquiry.top_k)
            .map_err(|source| InitializationError::Component {
                component: "inquiry service",
                source,
            })?;

        let ingestion = IngestionPipeline::new(
            embedder,
            knowledge.clone(),
            clock.clone(),
            config.ingestion.source_path.clone(),
        )
        .with_batch_size(config.ingestion.batch_size)
        .map_err(|source| InitializationError::Component {
            component: "ingestion pipeline",
            source,
        })?;

        let chat = BasicChatService::new(
            provider.clone(),
            config.provider.chat_model.clone(),
            config.provider.temperature,
        );
        let users = UserService::new(Arc::new(SqliteUserStore::new(pool)), clock);

        tracing::info!(
            provider = provider.name(),
            answer_mode = inquiry_mode_label(config.inquiry.answer_mode),
            top_k = config.inquiry.top_k,
            "Application state initialized"
        );

        Ok(Arc::new(Self {
            config: Arc::new(config),
            provider,
            knowledge,
            users: Arc::new(users),
            inquiry: Arc::new(inquiry),
            chat: Arc::new(chat),
            ingestion: Arc::new(ingestion),
            shutdown,
        }))
    }

    /// Token for one request; fires on server shutdown or when the request's
    /// deadline is reached.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.app.request_timeout_secs)
    }
}

fn inquiry_mode_label(mode: AnswerMode) -> &'static str {
    match mode {
        AnswerMode::Refine => "refine",
        AnswerMode::Direct => "direct",
    }
}
