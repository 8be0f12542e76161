use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ResetTokenConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Base URL prepended to reset links sent by mail.
    pub base_url: String,
    pub reset_token: ResetTokenConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let base_url = std::env::var("BASE_URL").context("BASE_URL must be set")?;
        let reset_token = ResetTokenConfig {
            secret: std::env::var("RESET_TOKEN_SECRET")
                .context("RESET_TOKEN_SECRET must be set")?,
            ttl_minutes: std::env::var("RESET_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        let mail = MailConfig {
            host: std::env::var("SMTP_HOST").context("SMTP_HOST must be set")?,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(465),
            username: std::env::var("SMTP_EMAIL").context("SMTP_EMAIL must be set")?,
            password: std::env::var("SMTP_PASSWORD").context("SMTP_PASSWORD must be set")?,
        };
        Ok(Self {
            database_url,
            base_url,
            reset_token,
            mail,
        })
    }
}
