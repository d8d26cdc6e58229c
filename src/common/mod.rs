pub mod axum_ip;
pub mod context;
pub mod error;
pub mod env;
pub mod init;
pub mod redis_json;
pub mod redis_pool;
pub mod state;
pub mod time;
