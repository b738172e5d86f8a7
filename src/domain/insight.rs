// Analysis result and persisted insight models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub key_insights: Vec<String>,
    pub recommendations: Vec<String>,
}

/// An analysis persisted against a dashboard. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub visualization_id: String,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(summary: String, key_insights: Vec<String>, recommendations: Vec<String>) -> Self {
        Self {
            summary,
            key_insights,
            recommendations,
        }
    }
}
