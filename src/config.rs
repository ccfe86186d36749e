use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// OpenAI-compatible endpoint used for bottle research. An empty key disables it.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub cors_origins: Vec<String>,
    pub jwt: JwtConfig,
    pub research: ResearchConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let database_url = get("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: get("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: parsed("JWT_ISSUER", "drinkshelf"),
            audience: parsed("JWT_AUDIENCE", "drinkshelf-users"),
            ttl_minutes: get("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let research = ResearchConfig {
            api_key: get("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            base_url: parsed("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model: parsed("OPENAI_MODEL", "gpt-4"),
            timeout_secs: get("OPENAI_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        };
        let cors_origins = get("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            app_name: parsed("APP_NAME", "DrinkShelf"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            host: parsed("APP_HOST", "0.0.0.0"),
            port: get("APP_PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("APP_PORT must be a port number")?
                .unwrap_or(8000),
            database_url,
            database_max_connections: get("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            cors_origins,
            jwt,
            research,
        })
    }
}
