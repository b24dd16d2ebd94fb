pub mod client;
pub mod config;
pub mod routes;
pub mod server;
pub mod service;
pub mod store;
pub mod student;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
