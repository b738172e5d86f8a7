// Repository traits for dashboards and their insights
use crate::domain::dashboard::{Dashboard, DashboardDraft, DashboardPatch};
use crate::domain::insight::{AnalysisResult, Insight};
use async_trait::async_trait;

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// All dashboards in creation order
    async fn list(&self) -> anyhow::Result<Vec<Dashboard>>;

    async fn find(&self, id: &str) -> anyhow::Result<Option<Dashboard>>;

    /// Insert with a freshly generated id
    async fn create(&self, draft: DashboardDraft) -> anyhow::Result<Dashboard>;

    /// `None` when no row has this id
    async fn update(&self, id: &str, patch: DashboardPatch) -> anyhow::Result<Option<Dashboard>>;

    /// `false` when no row has this id
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
}

/// Append-only insight log
#[async_trait]
pub trait InsightRepository: Send + Sync {
    async fn append(&self, dashboard_id: &str, analysis: &AnalysisResult) -> anyhow::Result<Insight>;

    /// Newest first
    async fn list_for(&self, dashboard_id: &str) -> anyhow::Result<Vec<Insight>>;
}
