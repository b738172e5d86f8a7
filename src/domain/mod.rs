// Domain layer - Core models with no I/O
pub mod chat;
pub mod dashboard;
pub mod insight;
