use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,

    // Inference engine
    pub api_url: Url,
    pub api_timeout: Duration,
    pub api_connect_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));

        let raw_url = env::var("DIAGNOSIS_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api".to_string());
        let api_url = parse_api_url(&raw_url)?;

        let api_timeout = Duration::from_secs(
            env::var("DIAGNOSIS_API_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        );
        let api_connect_timeout = Duration::from_secs(
            env::var("DIAGNOSIS_API_CONNECT_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        );

        Ok(Settings {
            env,
            api_url,
            api_timeout,
            api_connect_timeout,
        })
    }
}

/// Parse the engine base URL, normalised to end with a slash so that
/// relative joins keep the `/api` prefix.
pub fn parse_api_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(&format!("{}/", trimmed))
        .with_context(|| format!("DIAGNOSIS_API_URL is not a valid URL: {}", raw))
}
