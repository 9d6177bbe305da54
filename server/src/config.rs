use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub cors_allowed_origins: Vec<String>,
    pub mailer_endpoint: Option<String>,
    pub send_timeout: Duration,
    pub goal_multiplier: f64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL missing")?;

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let mailer_endpoint = std::env::var("MAILER_ENDPOINT").ok().filter(|s| !s.is_empty());

        let send_timeout = std::env::var("SEND_TIMEOUT_SECS")
            .ok()
            .map(|raw| raw.parse::<u64>().context("invalid SEND_TIMEOUT_SECS"))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        let goal_multiplier = std::env::var("GOAL_MULTIPLIER")
            .ok()
            .map(|raw| raw.parse::<f64>().context("invalid GOAL_MULTIPLIER"))
            .transpose()?
            .unwrap_or(1.2);

        Ok(Self {
            database_url,
            cors_allowed_origins,
            mailer_endpoint,
            send_timeout,
            goal_multiplier,
        })
    }
}
