//! Shared application state.

use rust_decimal::Decimal;

use crate::domain::events::DomainEvent;
use crate::inflight::InflightTransitions;
use crate::mailer::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
    pub mailer: Option<Mailer>,
    pub inflight: InflightTransitions,
    pub shipping_fee: Decimal,
}

impl AppState {
    /// Best-effort event publication; failures are logged, never fatal.
    pub async fn publish(&self, event: &DomainEvent) {
        let Some(nats) = &self.nats else { return };
        match serde_json::to_vec(event) {
            Ok(payload) => {
                if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
                    tracing::warn!(error = %e, subject = event.subject(), "event publish failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "event serialization failed"),
        }
    }

    /// Best-effort mail; a checkout never fails because the mail API did.
    pub async fn send_mail(&self, to: &str, subject: &str, body: &str) {
        let Some(mailer) = &self.mailer else { return };
        if let Err(e) = mailer.send(to, subject, body).await {
            tracing::warn!(error = %e, %to, "confirmation mail not sent");
        }
    }
}
