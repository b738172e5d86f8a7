// Dashboard service - Use cases for the dashboard registry
use crate::application::error::HubError;
use crate::application::repository::DashboardRepository;
use crate::domain::dashboard::{Dashboard, DashboardDraft, DashboardPatch};
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn DashboardRepository>,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn DashboardRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> Result<Vec<Dashboard>, HubError> {
        Ok(self.repository.list().await?)
    }

    pub async fn create(&self, draft: DashboardDraft) -> Result<Dashboard, HubError> {
        let draft = draft.validated().map_err(missing_field)?;
        let dashboard = self.repository.create(draft).await?;
        tracing::info!(id = %dashboard.id, name = %dashboard.name, "Dashboard registered");
        Ok(dashboard)
    }

    pub async fn update(&self, id: &str, patch: DashboardPatch) -> Result<Dashboard, HubError> {
        if patch.is_empty() {
            return Err(HubError::validation("name or url is required"));
        }
        let patch = patch.validated().map_err(missing_field)?;
        self.repository
            .update(id, patch)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("Visualization {}", id)))
    }

    pub async fn delete(&self, id: &str) -> Result<(), HubError> {
        if self.repository.delete(id).await? {
            tracing::info!(id, "Dashboard deleted");
            Ok(())
        } else {
            Err(HubError::NotFound(format!("Visualization {}", id)))
        }
    }
}

fn missing_field(field: &str) -> HubError {
    tracing::debug!(field, "Rejected dashboard input");
    HubError::validation(format!("{} is required", field))
}
