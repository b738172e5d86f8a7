// Error taxonomy shared by the services and the HTTP layer
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// Upstream model call, response parsing or persistence of the result.
    /// The cause is kept for server-side logging only.
    #[error("Failed to get analysis from AI service.")]
    AnalysisFailed(#[source] anyhow::Error),

    #[error("Chat request failed")]
    ChatFailed(#[source] anyhow::Error),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl HubError {
    pub fn validation(message: impl Into<String>) -> Self {
        HubError::Validation(message.into())
    }
}
