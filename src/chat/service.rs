//! Model chat without retrieval.
//!
//! `ask` forwards the user's message to the chat model as-is. `ask_structured`
//! runs the same message through the JSON-answer prompt and returns only the
//! `answer` field.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::cancel::run_cancellable;
use crate::core::errors::{ApiError, ResultExt};
use crate::llm::refiner::{parse_answer, JSON_ONLY_PROMPT};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

const ASSISTANT_PROMPT: &str = "You are a helpful assistant.";

pub struct BasicChatService {
    provider: Arc<dyn LlmProvider>,
    model_id: String,
    temperature: f64,
}

impl BasicChatService {
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

    pub async fn ask(&self, msg: &str, cancel: &CancellationToken) -> Result<String, ApiError> {
        let msg = validate_message(msg)?;
        let request = ChatRequest::new(vec![
            ChatMessage::system(ASSISTANT_PROMPT),
            ChatMessage::user(msg),
        ])
        .with_temperature(self.temperature);

        let reply = run_cancellable(
            cancel,
            "basic chat",
            self.provider.chat(request, &self.model_id),
        )
        .await
        .wrap_err("failed to ask")?;
        debug!(
            provider = self.provider.name(),
            chars = reply.len(),
            "Received basic chat reply"
        );
        Ok(reply)
    }

    /// Asks for a `{"answer": ...}` object and unwraps it. Replies wrapped in
    /// prose or code fences are accepted.
    pub async fn ask_structured(
        &self,
        msg: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        let msg = validate_message(msg)?;
        let request = ChatRequest::new(vec![
            ChatMessage::system(JSON_ONLY_PROMPT),
            ChatMessage::user(format!(
                "{}\n\n\
                 Return your response as a JSON object with this exact structure: \
                 {{\"answer\": \"your answer here\"}}.",
                msg
            )),
        ])
        .with_temperature(self.temperature)
        .json_object();

        let reply = run_cancellable(
            cancel,
            "structured chat",
            self.provider.chat(request, &self.model_id),
        )
        .await
        .wrap_err("failed to ask")?;

        parse_answer(&reply).wrap_err("failed to ask")
    }
}

fn validate_message(msg: &str) -> Result<&str, ApiError> {
    let msg = msg.trim();
    if msg.is_empty() {
        return Err(ApiError::invalid_parameter("message cannot be empty"));
    }
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::core::errors::ErrorCode;

    struct EchoProvider {
        reply: Result<String, ErrorCode>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
            self.seen.lock().unwrap().push(request);
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(code) => Err(ApiError::new(*code, "upstream unavailable")),
            }
        }

        async fn embed(
            &self,
            _inputs: &[String],
            _model_id: &str,
        ) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn service(reply: Result<&str, ErrorCode>) -> (BasicChatService, Arc<EchoProvider>) {
        let provider = Arc::new(EchoProvider {
            reply: reply.map(str::to_string),
            seen: Mutex::new(Vec::new()),
        });
        (BasicChatService::new(provider.clone(), "gpt-4o-mini", 0.7), provider)
    }

    #[tokio::test]
    async fn ask_sends_trimmed_message_after_system_prompt() {
        let (chat, provider) = service(Ok("Hello there"));
        let reply = chat
            .ask("  what is rust?  ", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply, "Hello there");

        let seen = provider.seen.lock().unwrap();
        let request = &seen[0];
        assert!(!request.json_mode);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[1].content, "what is rust?");
    }

    #[tokio::test]
    async fn blank_message_never_reaches_the_model() {
        let (chat, provider) = service(Ok("unused"));
        let err = chat.ask(" \n\t", &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        assert_eq!(err.to_string(), "message cannot be empty");
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_keeps_its_code() {
        let (chat, _) = service(Err(ErrorCode::ProviderError));
        let err = chat.ask("hi", &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderError);
        assert_eq!(err.to_string(), "failed to ask: upstream unavailable");
    }

    #[tokio::test]
    async fn cancelled_token_stops_the_call() {
        let (chat, provider) = service(Ok("unused"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = chat.ask("hi", &cancel).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Cancelled);
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn structured_ask_unwraps_the_answer_field() {
        let (chat, provider) = service(Ok("```json\n{\"answer\": \"Rust is a language\"}\n```"));
        let answer = chat
            .ask_structured("what is rust?", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(answer, "Rust is a language");

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0].json_mode);
        assert!(seen[0].messages[1].content.starts_with("what is rust?"));

        let (chat, _) = service(Ok("no json here"));
        let err = chat
            .ask_structured("what is rust?", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderError);
        assert!(err.to_string().starts_with("failed to ask"));
    }
}
