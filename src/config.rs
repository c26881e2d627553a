use anyhow::Context;

pub const DEFAULT_LLM_API_URL: &str = "https://api.studio.nebius.ai/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "meta-llama/Meta-Llama-3.1-8B-Instruct";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Remote chat-completion endpoint. The key is optional at startup and only
/// checked when a request actually needs the model.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub llm: LlmConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: get("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "chefbyte".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "chefbyte-users".into()),
            ttl_minutes: get("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: get("JWT_REFRESH_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let llm = LlmConfig {
            api_url: get("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.into()),
            api_key: get("LLM_API_KEY").filter(|k| !k.trim().is_empty()),
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.into()),
        };
        let host = get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match get("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT must be a valid port number, got {v:?}"))?,
            None => 5000,
        };

        Ok(Self {
            database_url,
            jwt,
            llm,
            host,
            port,
        })
    }
}
