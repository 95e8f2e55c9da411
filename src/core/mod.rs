pub mod cancel;
pub mod clock;
pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
