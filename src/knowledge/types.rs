use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// Embedding vector as produced by the embedding provider.
pub type Embedding = Vec<f32>;

/// A canonical question/answer pair of the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Assigned by the store; `None` until the entry is first written.
    pub id: Option<i64>,
    pub instruction: String,
    #[serde(skip_serializing)]
    pub instruction_embedding: Option<Embedding>,
    pub response: String,
    pub category: Option<String>,
    pub intent: Option<String>,
    pub flags: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    /// Builds a validated, un-embedded entry. Every field is trimmed; blank
    /// optional fields become `None`.
    pub fn new(
        instruction: &str,
        response: &str,
        category: &str,
        intent: &str,
        flags: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(ApiError::invalid_parameter("instruction cannot be empty"));
        }

        let response = response.trim();
        if response.is_empty() {
            return Err(ApiError::invalid_parameter("response cannot be empty"));
        }

        Ok(Self {
            id: None,
            instruction: instruction.to_string(),
            instruction_embedding: None,
            response: response.to_string(),
            category: optional_field(category),
            intent: optional_field(intent),
            flags: optional_field(flags),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_embedded(&self) -> bool {
        self.instruction_embedding
            .as_ref()
            .is_some_and(|embedding| !embedding.is_empty())
    }
}

fn optional_field(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// One tabular source row before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKnowledgeRecord {
    pub instruction: String,
    pub response: String,
    pub category: String,
    pub intent: String,
    pub flags: String,
}

impl RawKnowledgeRecord {
    pub fn into_entry(self, now: DateTime<Utc>) -> Result<KnowledgeEntry, ApiError> {
        KnowledgeEntry::new(
            &self.instruction,
            &self.response,
            &self.category,
            &self.intent,
            &self.flags,
            now,
        )
    }
}

/// A knowledge entry paired with its normalized similarity to a query.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityResult {
    pub entry: KnowledgeEntry,
    /// `[0, 1]`; 1.0 identical, 0.5 orthogonal, 0.0 opposite.
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorCode;

    #[test]
    fn new_entry_trims_and_drops_blank_optionals() {
        let entry = KnowledgeEntry::new(
            "  reset password ",
            " Go to settings > security\n",
            " account ",
            "   ",
            "",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(entry.instruction, "reset password");
        assert_eq!(entry.response, "Go to settings > security");
        assert_eq!(entry.category.as_deref(), Some("account"));
        assert_eq!(entry.intent, None);
        assert_eq!(entry.flags, None);
        assert!(!entry.is_embedded());
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn blank_instruction_or_response_is_rejected() {
        let err = KnowledgeEntry::new("  ", "answer", "", "", "", Utc::now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        assert_eq!(err.to_string(), "instruction cannot be empty");

        let record = RawKnowledgeRecord {
            instruction: "question".to_string(),
            response: "\t".to_string(),
            ..Default::default()
        };
        let err = record.into_entry(Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "response cannot be empty");
    }
}
