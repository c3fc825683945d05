// ============================================================================
// MAILERS
// ============================================================================
//
// Trois implémentations du trait Mailer :
//   - HttpMailer : API HTTP d'envoi (payload {sender, to, subject, htmlContent,
//     textContent} + header api-key)
//   - LogMailer : se contente de logger l'email (dev, pas d'API configurée)
//   - RecordingMailer : garde les emails en mémoire (tests)
//
// ============================================================================

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::config::MailConfig;

/// Email prêt à être envoyé
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub template: &'static str,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API rejected the message (status={status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Mailer de développement : log uniquement
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        log::info!(
            "[mail:{}] to={} subject={:?}\n{}",
            email.template,
            email.to,
            email.subject,
            email.text_body
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    html_content: String,
    text_content: String,
}

/// Mailer HTTP (API transactionnelle type Brevo)
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_email: String,
    from_name: String,
}

impl HttpMailer {
    pub fn new(api_url: String, config: &MailConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            api_url,
            api_key: config.api_key.clone(),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let body = SendEmailBody {
            sender: EmailAddress {
                email: self.from_email.clone(),
                name: Some(self.from_name.clone()).filter(|name| !name.is_empty()),
            },
            to: vec![EmailAddress {
                email: email.to.clone(),
                name: None,
            }],
            subject: email.subject.clone(),
            html_content: email.html_body.clone(),
            text_content: email.text_body.clone(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Mailer de test : enregistre les emails envoyés
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    pub fn sent_with_template(&self, template: &str) -> Vec<OutgoingEmail> {
        self.sent()
            .into_iter()
            .filter(|email| email.template == template)
            .collect()
    }

    /// Attend (au plus ~2s) qu'un email du template donné arrive à `to`
    pub async fn wait_for(&self, template: &str, to: &str) -> Option<OutgoingEmail> {
        for _ in 0..200 {
            let found = self
                .sent()
                .into_iter()
                .find(|email| email.template == template && email.to == to);
            if found.is_some() {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        Ok(())
    }
}
