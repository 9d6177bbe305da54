use api::engine::outbox::{Mailer, MailerError, OutgoingEmail};
use async_trait::async_trait;
use serde_json::json;

/// Posts rendered-message requests to the external templating service.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMailer {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let payload = json!({
            "to": email.to,
            "display_name": email.display_name,
            "template": email.template,
            "context": email.context,
        });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|err| MailerError(err.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(MailerError(format!(
                "mailer endpoint returned {}",
                response.status()
            )))
        }
    }
}

/// Logs instead of transmitting. Used when no MAILER_ENDPOINT is configured,
/// which keeps local development from needing a mail service.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        tracing::info!(to = %email.to, template = email.template, "mail transmission skipped (log mailer)");
        Ok(())
    }
}
