use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub gemini: GeminiSettings,
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisSettings {
    pub language: String,
}

impl GeminiSettings {
    /// The analysis endpoint cannot run without a credential
    pub fn require_api_key(&self) -> anyhow::Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("API_KEY environment variable not set."))
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn defaults() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3001)?
        .set_default("server.body_limit_bytes", 10 * 1024 * 1024)?
        .set_default("database.url", "sqlite://bi_insight_hub.db?mode=rwc")?
        .set_default("database.max_connections", 5)?
        .set_default("gemini.model", "gemini-2.5-flash")?
        .set_default(
            "gemini.base_url",
            "https://generativelanguage.googleapis.com/v1beta",
        )?
        .set_default("analysis.language", "Portuguese")?)
}

/// Defaults, then `config/hub.*`, then `HUB_*` variables, then the
/// conventional `PORT`, `DATABASE_URL` and `API_KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let api_key = std::env::var("API_KEY")
        .or_else(|_| std::env::var("GEMINI_API_KEY"))
        .ok();

    let settings = defaults()?
        .add_source(config::File::with_name("config/hub").required(false))
        .add_source(
            config::Environment::with_prefix("HUB")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("server.port", std::env::var("PORT").ok())?
        .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
        .set_override_option("gemini.api_key", api_key)?
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
fn load_from_toml(toml: &str) -> anyhow::Result<AppConfig> {
    let settings = defaults()?
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;
    Ok(settings.try_deserialize()?)
}
