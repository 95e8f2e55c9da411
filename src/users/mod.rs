pub mod service;
pub mod sqlite;
pub mod store;
pub mod types;

pub use service::{UserService, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use sqlite::SqliteUserStore;
pub use store::UserStore;
pub use types::{User, UserPage};
