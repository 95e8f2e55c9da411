use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::config::ProviderConfig;
use crate::core::errors::{ApiError, ErrorCode};

/// Client for any server speaking the OpenAI `/v1/chat/completions` and
/// `/v1/embeddings` wire format.
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ApiError::with_source(ErrorCode::InternalError, "failed to build HTTP client", e)
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn post_json(&self, path: &str, body: &Value, what: &str) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .authorized(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                ApiError::with_source(
                    ErrorCode::ProviderError,
                    format!("{} request failed", what),
                    e,
                )
            })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::new(
                ErrorCode::ProviderError,
                format!("{} error ({}): {}", what, status.as_u16(), text.trim()),
            ));
        }

        res.json::<Value>().await.map_err(|e| {
            ApiError::with_source(
                ErrorCode::ProviderError,
                format!("{} returned an invalid body", what),
                e,
            )
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/v1/models", self.base_url);
        let res = self.authorized(self.client.get(&url)).send().await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError> {
        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
            if request.json_mode {
                obj.insert("response_format".to_string(), json!({ "type": "json_object" }));
            }
        }

        let payload = self.post_json("/v1/chat/completions", &body, "chat completion").await?;
        extract_message_content(&payload)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let payload = self.post_json("/v1/embeddings", &body, "embedding").await?;
        parse_embedding_response(&payload, inputs.len())
    }
}

fn extract_message_content(payload: &Value) -> Result<String, ApiError> {
    payload
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::new(
                ErrorCode::ProviderError,
                "chat completion response missing message content",
            )
        })
}

/// Embeddings in input order. Each item lands in the slot named by its
/// `index` (its position when absent); every slot in `0..expected` must be
/// filled exactly once.
fn parse_embedding_response(payload: &Value, expected: usize) -> Result<Vec<Vec<f32>>, ApiError> {
    let Some(data) = payload.get("data").and_then(|v| v.as_array()) else {
        return Err(ApiError::provider("embedding response missing data array"));
    };
    if data.len() != expected {
        return Err(ApiError::provider(format!(
            "embedding response has {} items, expected {}",
            data.len(),
            expected
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (position, item) in data.iter().enumerate() {
        let Some(values) = item.get("embedding").and_then(|v| v.as_array()) else {
            return Err(ApiError::provider(
                "embedding response item missing embedding array",
            ));
        };

        let embedding = values
            .iter()
            .map(|value| value.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| ApiError::provider("embedding contains non-numeric value"))?;

        let index = match item.get("index") {
            None => position,
            Some(raw) => raw.as_u64().map(|v| v as usize).ok_or_else(|| {
                ApiError::provider("embedding index is not a non-negative integer")
            })?,
        };

        match slots.get_mut(index) {
            Some(slot @ None) => *slot = Some(embedding),
            Some(Some(_)) => {
                return Err(ApiError::provider(format!(
                    "embedding index {} appears more than once",
                    index
                )))
            }
            None => {
                return Err(ApiError::provider(format!(
                    "embedding index {} is out of range for {} inputs",
                    index, expected
                )))
            }
        }
    }

    // Equal lengths plus no duplicates leave no empty slot.
    Ok(slots.into_iter().flatten().collect())
}
