// Application layer - Use cases and the ports they depend on
pub mod analysis_service;
pub mod chat_session;
pub mod dashboard_service;
pub mod error;
pub mod generative_model;
pub mod repository;
pub mod response_normalizer;
