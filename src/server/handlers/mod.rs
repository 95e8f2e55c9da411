pub mod chat;
pub mod health;
pub mod inquiry;
pub mod users;
