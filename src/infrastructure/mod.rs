// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod database;
pub mod gemini_client;
pub mod http_response;
pub mod sql_repository;
