// Gemini REST client (generateContent)
use crate::application::generative_model::{
    GenerationRequest, GenerativeModel, Part, ResponseFormat,
};
use crate::domain::chat::Role;
use crate::infrastructure::config::GeminiSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<ContentBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ContentBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct ContentBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<PartBody>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum PartBody {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_settings(settings: &GeminiSettings) -> Result<Self> {
        let api_key = settings.require_api_key()?;
        Ok(Self::new(
            settings.base_url.clone(),
            api_key.to_string(),
            settings.model.clone(),
        ))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(&self.model)
        )
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

fn build_body(request: GenerationRequest) -> GenerateContentBody {
    let contents = request
        .turns
        .into_iter()
        .map(|turn| ContentBody {
            role: Some(role_name(turn.role)),
            parts: turn
                .parts
                .into_iter()
                .map(|part| match part {
                    Part::Text(text) => PartBody::Text { text },
                    Part::InlineImage { mime_type, data } => PartBody::InlineData {
                        inline_data: InlineData { mime_type, data },
                    },
                })
                .collect(),
        })
        .collect();

    GenerateContentBody {
        contents,
        system_instruction: request.system_instruction.map(|text| ContentBody {
            role: None,
            parts: vec![PartBody::Text { text }],
        }),
        generation_config: match request.response_format {
            ResponseFormat::Json => Some(GenerationConfig {
                response_mime_type: "application/json",
            }),
            ResponseFormat::Text => None,
        },
    }
}

fn reply_text(response: GenerateContentResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        anyhow::bail!("Gemini returned no text");
    }
    Ok(text)
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let body = build_body(request);
        tracing::debug!(model = %self.model, turns = body.contents.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini request failed with status {}: {}", status, body);
        }

        let data = response
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to parse Gemini response")?;

        reply_text(data)
    }
}
