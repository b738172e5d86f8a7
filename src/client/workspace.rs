// Workspace view-model - dashboard selection, analysis flow and chat
use crate::application::chat_session::ChatSession;
use crate::application::error::HubError;
use crate::application::generative_model::GenerativeModel;
use crate::client::api_client::HubApi;
use crate::client::capture::{CaptureError, CapturePipeline};
use crate::domain::chat::ChatMessage;
use crate::domain::dashboard::{Dashboard, DashboardDraft, DashboardPatch};
use crate::domain::insight::{AnalysisResult, Insight};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("No dashboard is selected")]
    NoSelection,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("{0}")]
    Backend(#[source] anyhow::Error),

    /// Local service failure, e.g. a chat session that could not start
    #[error(transparent)]
    Service(#[from] HubError),
}

impl WorkspaceError {
    /// Text shown to the user; permission denial gets its own wording
    pub fn user_message(&self) -> String {
        match self {
            WorkspaceError::Capture(CaptureError::PermissionDenied) => {
                "Permission to capture the screen was denied. Please allow sharing to use this feature."
                    .to_string()
            }
            WorkspaceError::Capture(e) => format!("Capture failed: {}", e),
            other => other.to_string(),
        }
    }
}

/// State tied to the selected dashboard; replaced wholesale on reselection
#[derive(Default)]
pub struct DashboardView {
    pub analysis: Option<AnalysisResult>,
    pub past_insights: Vec<Insight>,
    pub chat: Option<ChatSession>,
    pub error: Option<String>,
}

pub struct Workspace {
    api: Arc<dyn HubApi>,
    capture: CapturePipeline,
    chat_model: Arc<dyn GenerativeModel>,
    language: String,
    dashboards: Vec<Dashboard>,
    active_id: Option<String>,
    view: DashboardView,
    error: Option<String>,
}

impl Workspace {
    pub fn new(
        api: Arc<dyn HubApi>,
        capture: CapturePipeline,
        chat_model: Arc<dyn GenerativeModel>,
        language: String,
    ) -> Self {
        Self {
            api,
            capture,
            chat_model,
            language,
            dashboards: Vec::new(),
            active_id: None,
            view: DashboardView::default(),
            error: None,
        }
    }

    pub fn dashboards(&self) -> &[Dashboard] {
        &self.dashboards
    }

    pub fn active(&self) -> Option<&Dashboard> {
        let id = self.active_id.as_deref()?;
        self.dashboards.iter().find(|d| d.id == id)
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch the registry and keep or pick a selection
    pub async fn load(&mut self) -> Result<(), WorkspaceError> {
        self.error = None;
        let dashboards = self.api.list_dashboards().await.map_err(|e| {
            self.fail("Failed to load dashboards. Check that the backend service is running.", e)
        })?;
        self.dashboards = dashboards;

        let keep = self
            .active_id
            .as_deref()
            .is_some_and(|id| self.dashboards.iter().any(|d| d.id == id));
        if !keep {
            let first = self.dashboards.first().map(|d| d.id.clone());
            self.set_active(first).await;
        }
        Ok(())
    }

    pub async fn select(&mut self, id: &str) {
        if self.dashboards.iter().any(|d| d.id == id) {
            self.set_active(Some(id.to_string())).await;
        }
    }

    pub async fn create(&mut self, draft: DashboardDraft) -> Result<&Dashboard, WorkspaceError> {
        let created = self
            .api
            .create_dashboard(&draft)
            .await
            .map_err(|e| self.fail("Could not save the dashboard.", e))?;
        let id = created.id.clone();
        self.dashboards.push(created);
        self.set_active(Some(id)).await;
        self.active().ok_or(WorkspaceError::NoSelection)
    }

    pub async fn update(&mut self, id: &str, patch: DashboardPatch) -> Result<(), WorkspaceError> {
        let saved = self
            .api
            .update_dashboard(id, &patch)
            .await
            .map_err(|e| self.fail("Could not save the dashboard.", e))?;
        if let Some(slot) = self.dashboards.iter_mut().find(|d| d.id == saved.id) {
            *slot = saved;
        }
        Ok(())
    }

    /// Remove a dashboard. Deleting the selected one moves the selection to
    /// the first remaining dashboard, or clears it when none are left.
    pub async fn delete(&mut self, id: &str) -> Result<(), WorkspaceError> {
        self.api
            .delete_dashboard(id)
            .await
            .map_err(|e| self.fail("Could not delete the dashboard.", e))?;
        self.dashboards.retain(|d| d.id != id);

        if self.active_id.as_deref() == Some(id) {
            let next = self.dashboards.first().map(|d| d.id.clone());
            self.set_active(next).await;
        }
        Ok(())
    }

    /// Capture the screen, analyze it and open a chat about the result.
    /// Taking `&mut self` keeps one analysis in flight per workspace.
    pub async fn analyze(&mut self) -> Result<&AnalysisResult, WorkspaceError> {
        let id = self.active_id.clone().ok_or(WorkspaceError::NoSelection)?;
        self.view.analysis = None;
        self.view.chat = None;
        self.view.error = None;

        let result = match self.capture_and_analyze(&id).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(dashboard_id = %id, "Screen capture or analysis error: {}", e);
                self.view.error = Some(e.user_message());
                return Err(e);
            }
        };

        match self.api.insights_for(&id).await {
            Ok(history) => self.view.past_insights = history,
            Err(e) => tracing::warn!("Failed to refresh insight history: {:#}", e),
        }

        self.view.chat = Some(ChatSession::start(
            self.chat_model.clone(),
            &result,
            &self.language,
        )?);
        Ok(self.view.analysis.insert(result))
    }

    async fn capture_and_analyze(&self, id: &str) -> Result<AnalysisResult, WorkspaceError> {
        let image = self.capture.capture_base64_png().await?;
        self.api
            .analyze_dashboard(id, &image)
            .await
            .map_err(WorkspaceError::Backend)
    }

    /// Blank input, or no analysis to talk about, sends nothing.
    /// A failed send leaves an apology in the chat history.
    pub async fn send_chat(&mut self, text: &str) -> Option<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let session = self.view.chat.as_mut()?;
        session.send(text).await.ok()
    }

    async fn set_active(&mut self, id: Option<String>) {
        self.active_id = id;
        self.view = DashboardView::default();

        let Some(id) = self.active_id.clone() else {
            return;
        };
        match self.api.insights_for(&id).await {
            Ok(history) => self.view.past_insights = history,
            Err(e) => {
                tracing::warn!(dashboard_id = %id, "Failed to load insight history: {:#}", e);
                self.view.error = Some("Failed to load the analysis history.".to_string());
            }
        }
    }

    fn fail(&mut self, message: &str, cause: anyhow::Error) -> WorkspaceError {
        tracing::error!("{}: {:#}", message, cause);
        self.error = Some(message.to_string());
        WorkspaceError::Backend(cause)
    }
}
