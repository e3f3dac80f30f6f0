use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Mail gateway delivery timeout in seconds.
const MAIL_TIMEOUT_SECS: u64 = 5;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail gateway returned status {0}")]
    GatewayStatus(reqwest::StatusCode),
}

#[derive(Debug, Serialize)]
struct MailMessage {
    from: String,
    to: String,
    subject: String,
    text: String,
}

/// Best-effort transactional email over an HTTP mail gateway.
///
/// Sends are spawned and never awaited by handlers; a lost email must not
/// fail an HR record write. Failures are logged only. Constructed once in
/// `main` and injected via `web::Data`.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    gateway_url: Option<String>,
    sender: String,
}

impl Notifier {
    pub fn new(gateway_url: Option<String>, sender: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(MAIL_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Notifier {
            client,
            gateway_url,
            sender,
        }
    }

    async fn deliver(&self, message: MailMessage) -> Result<(), NotifyError> {
        let Some(url) = &self.gateway_url else {
            debug!(to = %message.to, subject = %message.subject, "Mail gateway not configured, dropping notification");
            return Ok(());
        };

        let response = self.client.post(url).json(&message).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::GatewayStatus(response.status()));
        }
        Ok(())
    }

    /// Fire-and-forget send. The handler keeps going regardless of outcome.
    pub fn send_best_effort(&self, to: &str, subject: &str, text: &str) {
        let notifier = self.clone();
        let message = MailMessage {
            from: self.sender.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
        };

        actix_web::rt::spawn(async move {
            if let Err(e) = notifier.deliver(message).await {
                warn!(error = %e, "Failed to send notification email");
            }
        });
    }
}
