// BI insight hub - dashboard registry, AI analysis and follow-up chat
pub mod application;
pub mod client;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
