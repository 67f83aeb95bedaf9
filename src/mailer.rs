//! Outbound mail over an HTTP mail API.
//!
//! Transport detail stays in the logs; callers only ever see a generic
//! dispatch failure.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail credentials are not configured")]
    NotConfigured,
    #[error("mail dispatch failed")]
    Dispatch,
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    sender: String,
}

impl Mailer {
    /// Fails fast when credentials are missing rather than at first send.
    pub fn from_config(
        endpoint: Option<String>,
        api_key: Option<String>,
        sender: Option<String>,
    ) -> Result<Self, MailError> {
        match (endpoint, api_key, sender) {
            (Some(endpoint), Some(api_key), Some(sender)) => {
                Ok(Self { http: reqwest::Client::new(), endpoint, api_key, sender })
            }
            _ => Err(MailError::NotConfigured),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&MailPayload { from: &self.sender, to, subject, body })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "mail transport error");
                MailError::Dispatch
            })?;
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "mail API rejected message");
            return Err(MailError::Dispatch);
        }
        tracing::info!(%to, %subject, "mail dispatched");
        Ok(())
    }
}
