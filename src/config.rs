//! Environment-driven configuration.

use anyhow::Context;
use rust_decimal::Decimal;

use crate::domain::pricing;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub nats_url: Option<String>,
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_sender: Option<String>,
    pub shipping_fee: Decimal,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let port = std::env::var("PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()
            .context("PORT must be a number")?
            .unwrap_or(8083);
        let shipping_fee = std::env::var("SHIPPING_FLAT_FEE")
            .ok()
            .map(|v| v.parse::<Decimal>())
            .transpose()
            .context("SHIPPING_FLAT_FEE must be a decimal")?
            .unwrap_or(pricing::DEFAULT_SHIPPING_FEE);
        Ok(Self {
            database_url,
            port,
            nats_url: std::env::var("NATS_URL").ok(),
            mail_api_url: std::env::var("MAIL_API_URL").ok(),
            mail_api_key: std::env::var("MAIL_API_KEY").ok(),
            mail_sender: std::env::var("MAIL_SENDER").ok(),
            shipping_fee,
        })
    }

    /// Any mail variable set at all: partial config should fail fast instead
    /// of silently disabling mail.
    pub fn mail_attempted(&self) -> bool {
        self.mail_api_url.is_some() || self.mail_api_key.is_some() || self.mail_sender.is_some()
    }
}
