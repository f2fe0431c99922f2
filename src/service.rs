pub mod analytics;
pub mod auth;
pub mod chat;
pub mod generate;
pub mod retrieval;
