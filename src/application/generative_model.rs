// Port for the multimodal AI model
use crate::domain::chat::{ChatMessage, Role};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineImage { mime_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }
}

impl From<&ChatMessage> for Turn {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            parts: vec![Part::Text(message.text.clone())],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    pub turns: Vec<Turn>,
    pub response_format: ResponseFormat,
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// One request, one attempt. Returns the concatenated text of the reply.
    async fn generate(&self, request: GenerationRequest) -> anyhow::Result<String>;
}
