pub mod service;

pub use service::BasicChatService;
