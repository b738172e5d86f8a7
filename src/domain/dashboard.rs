// Dashboard domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An external BI visualization embedded by URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: String,
    pub name: String,
    #[serde(alias = "embedUrl")]
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a new dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "embedUrl")]
    pub url: String,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "embedUrl", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl DashboardDraft {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Trimmed copy, or the name of the first empty field
    pub fn validated(&self) -> Result<Self, &'static str> {
        let name = required(&self.name, "name")?;
        let url = required(&self.url, "url")?;
        Ok(Self { name, url })
    }
}

impl DashboardPatch {
    pub fn validated(&self) -> Result<Self, &'static str> {
        let name = self
            .name
            .as_deref()
            .map(|n| required(n, "name"))
            .transpose()?;
        let url = self
            .url
            .as_deref()
            .map(|u| required(u, "url"))
            .transpose()?;
        Ok(Self { name, url })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.url.is_none()
    }
}

fn required(value: &str, field: &'static str) -> Result<String, &'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(field)
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_rejects_blank_fields() {
        assert_eq!(DashboardDraft::new("", "https://bi.example/1").validated(), Err("name"));
        assert_eq!(DashboardDraft::new("Sales", "   ").validated(), Err("url"));
    }

    #[test]
    fn test_draft_trims_and_accepts_any_url() {
        let draft = DashboardDraft::new("  Sales ", "not even a url").validated().unwrap();
        assert_eq!(draft.name, "Sales");
        assert_eq!(draft.url, "not even a url");
    }

    #[test]
    fn test_patch_only_checks_supplied_fields() {
        let patch = DashboardPatch {
            name: None,
            url: Some(" https://bi.example/2 ".to_string()),
        };
        let validated = patch.validated().unwrap();
        assert_eq!(validated.name, None);
        assert_eq!(validated.url.as_deref(), Some("https://bi.example/2"));

        let blank = DashboardPatch {
            name: Some(String::new()),
            url: None,
        };
        assert_eq!(blank.validated(), Err("name"));
    }

    #[test]
    fn test_draft_accepts_embed_url_alias() {
        let draft: DashboardDraft =
            serde_json::from_str(r#"{"name":"Ops","embedUrl":"https://bi.example/ops"}"#).unwrap();
        assert_eq!(draft.url, "https://bi.example/ops");
    }
}
