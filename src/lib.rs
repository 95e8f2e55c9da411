pub mod chat;
pub mod core;
pub mod ingest;
pub mod inquiry;
pub mod knowledge;
pub mod llm;
pub mod server;
pub mod state;
pub mod users;
pub mod vector_math;
