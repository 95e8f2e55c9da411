use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::json::extract_json_object;
use super::provider::LlmProvider;
use super::types::{ChatMessage, ChatRequest};
use crate::core::errors::{ApiError, ErrorCode, ResultExt};

pub(crate) const JSON_ONLY_PROMPT: &str = "You are a JSON-only response assistant. \
You MUST respond with ONLY valid JSON. \
The response must be a single JSON object with an 'answer' field containing a plain string value. \
Do NOT use markdown code blocks, backticks, or any formatting. Do NOT nest JSON objects. \
Return ONLY the raw JSON object.";

const ASSISTANT_PROMPT: &str =
    "You are a helpful assistant that answers questions based on the provided context.
Use the context information to provide accurate and relevant answers.
If the context doesn't contain enough information to answer the question, say so honestly.";

/// Turns a retrieved-context block into a user-facing answer.
#[async_trait]
pub trait AnswerRefiner: Send + Sync {
    async fn refine(&self, context: &str) -> Result<String, ApiError>;
}

pub struct LlmAnswerRefiner {
    provider: Arc<dyn LlmProvider>,
    model_id: String,
    temperature: f64,
}

impl LlmAnswerRefiner {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model_id: impl Into<String>,
        temperature: f64,
    ) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
            temperature,
        }
    }
}

pub(crate) fn build_messages(context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(JSON_ONLY_PROMPT),
        ChatMessage::system(ASSISTANT_PROMPT),
        ChatMessage::user(format!(
            "Context information:\n{}\n\n\
             Please answer the question based on the context provided above.\n\
             Return your response as a JSON object with this exact structure: \
             {{\"answer\": \"your answer here\"}}.\n\
             The answer field must contain a plain string, not nested JSON.",
            context
        )),
    ]
}

/// Reads the `answer` string out of a model reply.
pub(crate) fn parse_answer(content: &str) -> Result<String, ApiError> {
    let Some(candidate) = extract_json_object(content) else {
        return Err(ApiError::provider("model reply contains no JSON object"));
    };

    let payload: Value = serde_json::from_str(candidate).map_err(|e| {
        ApiError::with_source(ErrorCode::ProviderError, "model reply is not valid JSON", e)
    })?;

    match payload.get("answer") {
        Some(Value::String(answer)) => Ok(answer.clone()),
        Some(_) => Err(ApiError::provider("'answer' field is not a string")),
        None => Err(ApiError::provider("model reply is missing the 'answer' field")),
    }
}

#[async_trait]
impl AnswerRefiner for LlmAnswerRefiner {
    async fn refine(&self, context: &str) -> Result<String, ApiError> {
        let request = ChatRequest::new(build_messages(context))
            .with_temperature(self.temperature)
            .json_object();

        let reply = self
            .provider
            .chat(request, &self.model_id)
            .await
            .wrap_err_as(ErrorCode::ProviderError, "failed to invoke chat model")?;
        debug!(provider = self.provider.name(), chars = reply.len(), "Received refine reply");

        parse_answer(&reply).wrap_err("failed to parse refined answer")
    }
}
