// Follow-up chat seeded with one analysis
use crate::application::error::HubError;
use crate::application::generative_model::{GenerationRequest, GenerativeModel, Turn};
use crate::domain::chat::ChatMessage;
use crate::domain::insight::AnalysisResult;
use anyhow::Context;
use std::sync::Arc;

/// Fixed model-side lines, in the answer language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phrasebook {
    pub greeting: &'static str,
    pub apology: &'static str,
}

const ENGLISH: Phrasebook = Phrasebook {
    greeting: "Analysis complete. I've reviewed the insights. What questions do you have about the data?",
    apology: "Sorry, I ran into an error. Please try again.",
};

const PORTUGUESE: Phrasebook = Phrasebook {
    greeting: "Análise concluída. Revisei os insights. Que perguntas você tem sobre os dados?",
    apology: "Desculpe, ocorreu um erro. Por favor, tente novamente.",
};

/// Falls back to English for languages without a translation
pub fn phrasebook(language: &str) -> Phrasebook {
    match language.trim().to_lowercase().as_str() {
        "portuguese" | "português" | "portugues" | "pt" | "pt-br" | "pt-pt" => PORTUGUESE,
        _ => ENGLISH,
    }
}

/// Transcript plus the hidden instruction that carries the seed analysis.
/// Lives as long as one dashboard selection.
pub struct ChatSession {
    model: Arc<dyn GenerativeModel>,
    system_instruction: String,
    phrases: Phrasebook,
    /// Everything shown to the user, greeting and apologies included
    transcript: Vec<ChatMessage>,
    /// Exchanges the model has answered; this is what gets forwarded
    context: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn start(
        model: Arc<dyn GenerativeModel>,
        seed: &AnalysisResult,
        language: &str,
    ) -> Result<Self, HubError> {
        let seed_json = serde_json::to_string(seed).context("failed to serialize seed analysis")?;
        let phrases = phrasebook(language);
        Ok(Self {
            model,
            system_instruction: system_instruction(&seed_json, language),
            phrases,
            transcript: vec![ChatMessage::model(phrases.greeting)],
            context: Vec::new(),
        })
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Greeting first, then the conversation in order
    pub fn history(&self) -> Vec<ChatMessage> {
        self.transcript.clone()
    }

    /// Forward the answered exchanges plus this question and append the reply.
    /// On failure the question stays visible, followed by an apology, but is
    /// never forwarded again.
    pub async fn send(&mut self, text: &str) -> Result<ChatMessage, HubError> {
        let question = ChatMessage::user(text);
        self.transcript.push(question.clone());

        let request = GenerationRequest {
            system_instruction: Some(self.system_instruction.clone()),
            turns: self
                .context
                .iter()
                .chain(std::iter::once(&question))
                .map(Turn::from)
                .collect(),
            ..Default::default()
        };

        match self.model.generate(request).await {
            Ok(reply) => {
                let message = ChatMessage::model(reply);
                self.context.push(question);
                self.context.push(message.clone());
                self.transcript.push(message.clone());
                Ok(message)
            }
            Err(e) => {
                tracing::warn!("Chat request failed: {:#}", e);
                self.transcript.push(ChatMessage::model(self.phrases.apology));
                Err(HubError::ChatFailed(e))
            }
        }
    }
}

fn system_instruction(seed_json: &str, language: &str) -> String {
    format!(
        r#"You are a professional and helpful data analyst. The user has just received an AI-generated analysis of a business intelligence dashboard. The analysis is as follows: {seed_json}. Your main goal is to answer the user's questions about this analysis and the underlying data it might represent. When asked to create a chart or visualization, you MUST respond ONLY with a single, valid JSON object. The JSON must have this exact structure: {{"type": "chart", "chartType": "bar" | "line" | "pie", "data": [...], "title": "Chart Title"}}. For all chart types, the "data" array must contain objects with "name" (string for the label) and "value" (number for the data point) keys. Do not include any text, explanations, or markdown fences like ```json around the JSON object. For all other questions, provide a clear, text-based answer in {language}."#
    )
}
