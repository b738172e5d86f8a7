// REST client for the hub API
use crate::domain::dashboard::{Dashboard, DashboardDraft, DashboardPatch};
use crate::domain::insight::{AnalysisResult, Insight};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[async_trait]
pub trait HubApi: Send + Sync {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>>;
    async fn create_dashboard(&self, draft: &DashboardDraft) -> Result<Dashboard>;
    async fn update_dashboard(&self, id: &str, patch: &DashboardPatch) -> Result<Dashboard>;
    async fn delete_dashboard(&self, id: &str) -> Result<()>;
    async fn analyze_dashboard(&self, id: &str, image: &str) -> Result<AnalysisResult>;
    async fn insights_for(&self, id: &str) -> Result<Vec<Insight>>;
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Debug, Clone)]
pub struct HubClient {
    base_url: String,
    client: reqwest::Client,
}

impl HubClient {
    /// `base_url` includes the API prefix, e.g. `http://localhost:3001/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Server message when the body carries one, otherwise the fallback
async fn ensure_success(response: reqwest::Response, fallback: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let message = response
        .json::<ErrorMessage>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| fallback.to_string());
    anyhow::bail!("{} ({})", message, status)
}

#[async_trait]
impl HubApi for HubClient {
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>> {
        let response = self
            .client
            .get(self.url("/visualizations"))
            .send()
            .await
            .context("Failed to fetch visualizations")?;
        let response = ensure_success(response, "Failed to fetch visualizations").await?;
        Ok(response.json().await?)
    }

    async fn create_dashboard(&self, draft: &DashboardDraft) -> Result<Dashboard> {
        let response = self
            .client
            .post(self.url("/visualizations"))
            .json(draft)
            .send()
            .await
            .context("Failed to save visualization")?;
        let response = ensure_success(response, "Failed to save visualization").await?;
        Ok(response.json().await?)
    }

    async fn update_dashboard(&self, id: &str, patch: &DashboardPatch) -> Result<Dashboard> {
        let response = self
            .client
            .put(self.url(&format!("/visualizations/{}", urlencoding::encode(id))))
            .json(patch)
            .send()
            .await
            .context("Failed to save visualization")?;
        let response = ensure_success(response, "Failed to save visualization").await?;
        Ok(response.json().await?)
    }

    async fn delete_dashboard(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/visualizations/{}", urlencoding::encode(id))))
            .send()
            .await
            .context("Failed to delete visualization")?;
        ensure_success(response, "Failed to delete visualization").await?;
        Ok(())
    }

    async fn analyze_dashboard(&self, id: &str, image: &str) -> Result<AnalysisResult> {
        let response = self
            .client
            .post(self.url("/analysis"))
            .json(&json!({ "dashboardId": id, "image": image }))
            .send()
            .await
            .context("Failed to analyze dashboard")?;
        let response = ensure_success(response, "Failed to analyze dashboard").await?;
        Ok(response.json().await?)
    }

    async fn insights_for(&self, id: &str) -> Result<Vec<Insight>> {
        let response = self
            .client
            .get(self.url(&format!(
                "/visualizations/{}/insights",
                urlencoding::encode(id)
            )))
            .send()
            .await
            .context("Failed to fetch insights history")?;
        let response = ensure_success(response, "Failed to fetch insights history").await?;
        Ok(response.json().await?)
    }
}
