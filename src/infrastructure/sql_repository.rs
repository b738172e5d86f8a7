// SQL repository implementation
use crate::application::repository::{DashboardRepository, InsightRepository};
use crate::domain::dashboard::{Dashboard, DashboardDraft, DashboardPatch};
use crate::domain::insight::{AnalysisResult, Insight};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SqlRepository {
    pool: Pool<Sqlite>,
}

#[derive(Debug, sqlx::FromRow)]
struct VisualizationRow {
    id: String,
    name: String,
    url: String,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct InsightRow {
    id: String,
    visualization_id: String,
    summary: String,
    key_insights: String,
    recommendations: String,
    created_at: String,
}

impl SqlRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

/// Fixed-width timestamps so that text ordering is chronological
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid timestamp {}", raw))?
        .with_timezone(&Utc))
}

impl TryFrom<VisualizationRow> for Dashboard {
    type Error = anyhow::Error;

    fn try_from(row: VisualizationRow) -> Result<Self> {
        Ok(Dashboard {
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            name: row.name,
            url: row.url,
        })
    }
}

impl TryFrom<InsightRow> for Insight {
    type Error = anyhow::Error;

    fn try_from(row: InsightRow) -> Result<Self> {
        let key_insights: Vec<String> =
            serde_json::from_str(&row.key_insights).context("Corrupt key_insights column")?;
        let recommendations: Vec<String> =
            serde_json::from_str(&row.recommendations).context("Corrupt recommendations column")?;

        Ok(Insight {
            created_at: parse_timestamp(&row.created_at)?,
            id: row.id,
            visualization_id: row.visualization_id,
            analysis: AnalysisResult::new(row.summary, key_insights, recommendations),
        })
    }
}

#[async_trait]
impl DashboardRepository for SqlRepository {
    async fn list(&self) -> Result<Vec<Dashboard>> {
        let rows = sqlx::query_as::<_, VisualizationRow>(
            "SELECT id, name, url, created_at, updated_at FROM visualizations ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list visualizations")?;

        rows.into_iter().map(Dashboard::try_from).collect()
    }

    async fn find(&self, id: &str) -> Result<Option<Dashboard>> {
        let row = sqlx::query_as::<_, VisualizationRow>(
            "SELECT id, name, url, created_at, updated_at FROM visualizations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load visualization")?;

        row.map(Dashboard::try_from).transpose()
    }

    async fn create(&self, draft: DashboardDraft) -> Result<Dashboard> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp(Utc::now());

        let row = sqlx::query_as::<_, VisualizationRow>(
            r#"
            INSERT INTO visualizations (id, name, url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, url, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&draft.url)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert visualization")?;

        row.try_into()
    }

    async fn update(&self, id: &str, patch: DashboardPatch) -> Result<Option<Dashboard>> {
        let row = sqlx::query_as::<_, VisualizationRow>(
            r#"
            UPDATE visualizations
            SET name = COALESCE(?, name), url = COALESCE(?, url), updated_at = ?
            WHERE id = ?
            RETURNING id, name, url, created_at, updated_at
            "#,
        )
        .bind(&patch.name)
        .bind(&patch.url)
        .bind(timestamp(Utc::now()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update visualization")?;

        row.map(Dashboard::try_from).transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM visualizations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete visualization")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl InsightRepository for SqlRepository {
    async fn append(&self, dashboard_id: &str, analysis: &AnalysisResult) -> Result<Insight> {
        let id = Uuid::new_v4().to_string();

        let row = sqlx::query_as::<_, InsightRow>(
            r#"
            INSERT INTO insights (id, visualization_id, summary, key_insights, recommendations, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, visualization_id, summary, key_insights, recommendations, created_at
            "#,
        )
        .bind(&id)
        .bind(dashboard_id)
        .bind(&analysis.summary)
        .bind(serde_json::to_string(&analysis.key_insights)?)
        .bind(serde_json::to_string(&analysis.recommendations)?)
        .bind(timestamp(Utc::now()))
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert insight")?;

        row.try_into()
    }

    async fn list_for(&self, dashboard_id: &str) -> Result<Vec<Insight>> {
        let rows = sqlx::query_as::<_, InsightRow>(
            r#"
            SELECT id, visualization_id, summary, key_insights, recommendations, created_at
            FROM insights
            WHERE visualization_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(dashboard_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list insights")?;

        rows.into_iter().map(Insight::try_from).collect()
    }
}
