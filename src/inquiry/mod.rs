pub mod context;
pub mod service;

pub use context::build_context;
pub use service::{AnswerStrategy, InquiryAnswer, InquiryService, DEFAULT_TOP_K};
