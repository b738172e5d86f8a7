// Chat transcript models and reply classification
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }

    pub fn content(&self) -> MessageContent {
        MessageContent::classify(&self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

/// Chart payload exactly as the model sent it. Nothing is validated;
/// `kind()` and `points()` offer typed views for renderers that want them.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub chart_type: String,
    pub title: String,
    pub data: Value,
}

impl ChartSpec {
    fn from_value(value: &Value) -> Self {
        Self {
            chart_type: value
                .get("chartType")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            title: value
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            data: value.get("data").cloned().unwrap_or(Value::Null),
        }
    }

    pub fn kind(&self) -> Option<ChartKind> {
        match self.chart_type.as_str() {
            "bar" => Some(ChartKind::Bar),
            "line" => Some(ChartKind::Line),
            "pie" => Some(ChartKind::Pie),
            _ => None,
        }
    }

    /// Entries with a string `name` and numeric `value`; others are skipped
    pub fn points(&self) -> Vec<ChartPoint> {
        self.data
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        Some(ChartPoint {
                            name: item.get("name")?.as_str()?.to_string(),
                            value: item.get("value")?.as_f64()?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Chart(ChartSpec),
}

impl MessageContent {
    /// A reply is a chart when it parses as JSON (after dropping a leading
    /// ```json fence) and carries `"type": "chart"`. Everything else is text.
    pub fn classify(text: &str) -> Self {
        let candidate = match text.strip_prefix("```json") {
            Some(rest) => rest.strip_suffix("```").unwrap_or(rest).trim(),
            None => text,
        };

        match serde_json::from_str::<Value>(candidate) {
            Ok(value) if value.get("type").and_then(Value::as_str) == Some("chart") => {
                MessageContent::Chart(ChartSpec::from_value(&value))
            }
            _ => MessageContent::Text(text.to_string()),
        }
    }
}
