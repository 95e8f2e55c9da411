pub mod sqlite;
pub mod store;
pub mod types;

pub use sqlite::SqliteKnowledgeStore;
pub use store::KnowledgeStore;
pub use types::{Embedding, KnowledgeEntry, RawKnowledgeRecord, SimilarityResult};
