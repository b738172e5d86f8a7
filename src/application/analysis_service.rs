// Analysis service - Screenshot in, persisted insight out
use crate::application::error::HubError;
use crate::application::generative_model::{
    GenerationRequest, GenerativeModel, Part, ResponseFormat, Turn,
};
use crate::application::repository::{DashboardRepository, InsightRepository};
use crate::application::response_normalizer::normalize_analysis;
use crate::domain::insight::{AnalysisResult, Insight};
use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

const IMAGE_MIME_TYPE: &str = "image/png";

#[derive(Clone)]
pub struct AnalysisService {
    model: Arc<dyn GenerativeModel>,
    dashboards: Arc<dyn DashboardRepository>,
    insights: Arc<dyn InsightRepository>,
    language: String,
}

impl AnalysisService {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        dashboards: Arc<dyn DashboardRepository>,
        insights: Arc<dyn InsightRepository>,
        language: String,
    ) -> Self {
        Self {
            model,
            dashboards,
            insights,
            language,
        }
    }

    /// Single attempt: model call, normalization, then persistence.
    /// Any failure along the way surfaces as `AnalysisFailed`.
    pub async fn analyze_and_persist(
        &self,
        dashboard_id: &str,
        image: &str,
    ) -> Result<AnalysisResult, HubError> {
        let dashboard_id = dashboard_id.trim();
        if dashboard_id.is_empty() {
            return Err(HubError::validation("dashboardId and image are required"));
        }
        let image = validate_image(image)?;
        self.require_dashboard(dashboard_id).await?;

        let request = GenerationRequest {
            system_instruction: None,
            turns: vec![Turn::user(vec![
                Part::Text(analysis_prompt(&self.language)),
                Part::InlineImage {
                    mime_type: IMAGE_MIME_TYPE.to_string(),
                    data: image.to_string(),
                },
            ])],
            response_format: ResponseFormat::Json,
        };

        let result = self
            .run(dashboard_id, request)
            .await
            .map_err(|e| {
                tracing::error!(dashboard_id, "Analysis failed: {:#}", e);
                HubError::AnalysisFailed(e)
            })?;

        tracing::info!(
            dashboard_id,
            insights = result.key_insights.len(),
            recommendations = result.recommendations.len(),
            "Analysis stored"
        );
        Ok(result)
    }

    async fn run(
        &self,
        dashboard_id: &str,
        request: GenerationRequest,
    ) -> anyhow::Result<AnalysisResult> {
        let reply = self
            .model
            .generate(request)
            .await
            .context("model request failed")?;
        tracing::debug!(dashboard_id, bytes = reply.len(), "Model reply received");

        let result = normalize_analysis(&reply)?;
        self.insights
            .append(dashboard_id, &result)
            .await
            .context("failed to persist insight")?;
        Ok(result)
    }

    pub async fn insights_for(&self, dashboard_id: &str) -> Result<Vec<Insight>, HubError> {
        self.require_dashboard(dashboard_id).await?;
        Ok(self.insights.list_for(dashboard_id).await?)
    }

    async fn require_dashboard(&self, dashboard_id: &str) -> Result<(), HubError> {
        match self.dashboards.find(dashboard_id).await? {
            Some(_) => Ok(()),
            None => Err(HubError::NotFound(format!("Visualization {}", dashboard_id))),
        }
    }
}

/// Bare base64 payload of a `data:<mime>;base64,<payload>` URI; other input unchanged
pub fn strip_data_uri_prefix(image: &str) -> &str {
    match image.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, payload)| payload).unwrap_or(image),
        None => image,
    }
}

fn validate_image(image: &str) -> Result<&str, HubError> {
    let payload = strip_data_uri_prefix(image.trim()).trim();
    if payload.is_empty() {
        return Err(HubError::validation("dashboardId and image are required"));
    }
    STANDARD.decode(payload).map_err(|e| {
        tracing::debug!("Rejected image payload: {}", e);
        HubError::validation("image must be a base64 encoded PNG")
    })?;
    Ok(payload)
}

fn analysis_prompt(language: &str) -> String {
    format!(
        r#"You are an expert data analyst. Your task is to analyze the provided screenshot of a business intelligence dashboard. Based on the charts and tables visible in the image, provide a concise and comprehensive analysis.

Structure your answer strictly as a JSON object written in {language} with the keys "summary", "key_insights" and "recommendations".

- "summary": a brief, one-sentence overview of what the dashboard represents.
- "key_insights": a JSON array of 3 to 5 sentences, one per item, identifying trends, patterns or important data points. Mention any potential anomalies or outliers.
- "recommendations": a JSON array of 2 to 3 sentences, one per item, with practical suggestions or areas for investigation.

Do not include any text, explanation or markdown formatting (such as ```json) outside the main JSON object. The answer must be only the JSON."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::{Dashboard, DashboardDraft, DashboardPatch};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    const PNG_B64: &str = "iVBORw0KGgo=";

    struct ScriptedModel {
        reply: anyhow::Result<String>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(anyhow::anyhow!("connection reset")),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, request: GenerationRequest) -> anyhow::Result<String> {
            self.requests.lock().unwrap().push(request);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            }
        }
    }

    /// Registry that knows a fixed set of ids
    struct KnownDashboards(Vec<&'static str>);

    #[async_trait]
    impl DashboardRepository for KnownDashboards {
        async fn list(&self) -> anyhow::Result<Vec<Dashboard>> {
            Ok(Vec::new())
        }

        async fn find(&self, id: &str) -> anyhow::Result<Option<Dashboard>> {
            let now = Utc::now();
            Ok(self.0.iter().any(|known| *known == id).then(|| Dashboard {
                id: id.to_string(),
                name: "Sales".to_string(),
                url: "https://bi.example/sales".to_string(),
                created_at: now,
                updated_at: now,
            }))
        }

        async fn create(&self, _draft: DashboardDraft) -> anyhow::Result<Dashboard> {
            anyhow::bail!("read-only registry")
        }

        async fn update(&self, _id: &str, _patch: DashboardPatch) -> anyhow::Result<Option<Dashboard>> {
            Ok(None)
        }

        async fn delete(&self, _id: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    #[derive(Default)]
    struct MemoryInsights {
        rows: Mutex<Vec<Insight>>,
    }

    #[async_trait]
    impl InsightRepository for MemoryInsights {
        async fn append(&self, dashboard_id: &str, analysis: &AnalysisResult) -> anyhow::Result<Insight> {
            let insight = Insight {
                id: format!("i-{}", self.rows.lock().unwrap().len()),
                visualization_id: dashboard_id.to_string(),
                analysis: analysis.clone(),
                created_at: Utc::now(),
            };
            self.rows.lock().unwrap().insert(0, insight.clone());
            Ok(insight)
        }

        async fn list_for(&self, dashboard_id: &str) -> anyhow::Result<Vec<Insight>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.visualization_id == dashboard_id)
                .cloned()
                .collect())
        }
    }

    fn service(model: Arc<ScriptedModel>, insights: Arc<MemoryInsights>) -> AnalysisService {
        AnalysisService::new(
            model,
            Arc::new(KnownDashboards(vec!["dash-1"])),
            insights,
            "Portuguese".to_string(),
        )
    }

    #[tokio::test]
    async fn test_analysis_is_normalized_and_persisted() {
        let model = Arc::new(ScriptedModel::replying(
            "```json\n{\"summary\":\"Sales overview\",\"key_insights\":\"\\\"A\\\", \\\"B, C\\\"\",\"recommendations\":[\"Act\"]}\n```",
        ));
        let insights = Arc::new(MemoryInsights::default());
        let svc = service(model.clone(), insights.clone());

        let result = svc.analyze_and_persist("dash-1", PNG_B64).await.unwrap();
        assert_eq!(result.summary, "Sales overview");
        assert_eq!(result.key_insights, vec!["A", "B, C"]);
        assert_eq!(result.recommendations, vec!["Act"]);

        let stored = svc.insights_for("dash-1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].analysis, result);
    }

    #[tokio::test]
    async fn test_request_carries_prompt_and_image() {
        let model = Arc::new(ScriptedModel::replying(
            r#"{"summary":"s","key_insights":[],"recommendations":[]}"#,
        ));
        let svc = service(model.clone(), Arc::new(MemoryInsights::default()));

        svc.analyze_and_persist("dash-1", &format!("data:image/png;base64,{}", PNG_B64))
            .await
            .unwrap();

        let requests = model.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.response_format, ResponseFormat::Json);
        let parts = &request.turns[0].parts;
        assert!(matches!(&parts[0], Part::Text(prompt) if prompt.contains("Portuguese")));
        assert_eq!(
            parts[1],
            Part::InlineImage {
                mime_type: "image/png".to_string(),
                data: PNG_B64.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_analysis_failed() {
        let insights = Arc::new(MemoryInsights::default());
        let svc = service(Arc::new(ScriptedModel::failing()), insights.clone());

        let err = svc.analyze_and_persist("dash-1", PNG_B64).await.unwrap_err();
        assert!(matches!(err, HubError::AnalysisFailed(_)));
        assert!(insights.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_reply_is_analysis_failed() {
        let insights = Arc::new(MemoryInsights::default());
        let svc = service(
            Arc::new(ScriptedModel::replying("Sorry, I can't help with that.")),
            insights.clone(),
        );

        let err = svc.analyze_and_persist("dash-1", PNG_B64).await.unwrap_err();
        assert!(matches!(err, HubError::AnalysisFailed(_)));
        assert!(insights.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_inputs_are_validation_errors() {
        let model = Arc::new(ScriptedModel::replying("{}"));
        let svc = service(model.clone(), Arc::new(MemoryInsights::default()));

        assert!(matches!(
            svc.analyze_and_persist("", PNG_B64).await,
            Err(HubError::Validation(_))
        ));
        assert!(matches!(
            svc.analyze_and_persist("dash-1", "").await,
            Err(HubError::Validation(_))
        ));
        assert!(matches!(
            svc.analyze_and_persist("dash-1", "not base64!").await,
            Err(HubError::Validation(_))
        ));
        assert!(model.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_dashboard_is_not_found_before_model_call() {
        let model = Arc::new(ScriptedModel::replying("{}"));
        let svc = service(model.clone(), Arc::new(MemoryInsights::default()));

        assert!(matches!(
            svc.analyze_and_persist("ghost", PNG_B64).await,
            Err(HubError::NotFound(_))
        ));
        assert!(matches!(svc.insights_for("ghost").await, Err(HubError::NotFound(_))));
        assert!(model.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_strip_data_uri_prefix() {
        assert_eq!(strip_data_uri_prefix("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_uri_prefix("AAAA"), "AAAA");
    }
}
