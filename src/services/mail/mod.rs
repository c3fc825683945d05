// ============================================================================
// EMAILS
// ============================================================================
//
// Description:
//   Canal d'envoi "fire-and-forget" : le template est rendu tout de suite,
//   l'envoi part sur une tâche tokio et ne bloque jamais la requête.
//
// Points d'attention:
//   - Un échec est retenté `max_retries` fois avec un délai fixe
//   - L'échec final est loggé, jamais remonté à l'appelant
//
// ============================================================================

pub mod mailer;
pub mod templates;

use std::sync::Arc;
use std::time::Duration;

use crate::config::MailConfig;

pub use mailer::{HttpMailer, LogMailer, MailError, Mailer, OutgoingEmail, RecordingMailer};
pub use templates::{
    EmailTemplate, EmailVerificationEmail, InstructorApprovedEmail,
    InstructorRequestNotificationEmail, InstructorRejectedEmail, PasswordResetEmail,
};

#[derive(Clone)]
pub struct EmailDispatcher {
    mailer: Arc<dyn Mailer>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl EmailDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, max_retries: u32, retry_backoff: Duration) -> Self {
        Self {
            mailer,
            max_retries,
            retry_backoff,
        }
    }

    /// Choisit le mailer HTTP si EMAIL_API_URL est configuré, sinon le LogMailer
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let mailer: Arc<dyn Mailer> = match &config.api_url {
            Some(api_url) => Arc::new(HttpMailer::new(api_url.clone(), config)?),
            None => {
                log::warn!("EMAIL_API_URL not set, emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        Ok(Self::new(mailer, config.max_retries, config.retry_backoff))
    }

    /// Rend le template et planifie l'envoi en arrière-plan
    pub fn dispatch<T: EmailTemplate>(&self, to: &str, template: &T) {
        let email = match render(to, template) {
            Ok(email) => email,
            Err(e) => {
                log::error!("Failed to render email template {}: {}", T::NAME, e);
                return;
            }
        };

        let mailer = Arc::clone(&self.mailer);
        let max_retries = self.max_retries;
        let retry_backoff = self.retry_backoff;

        tokio::spawn(async move {
            deliver(mailer.as_ref(), &email, max_retries, retry_backoff).await;
        });
    }
}

pub fn render<T: EmailTemplate>(to: &str, template: &T) -> Result<OutgoingEmail, MailError> {
    let html_body = template.render()?;
    let text_body = templates::strip_tags(&html_body);

    Ok(OutgoingEmail {
        template: T::NAME,
        to: to.to_string(),
        subject: template.subject(),
        html_body,
        text_body,
    })
}

/// Envoie avec retry fixe, retourne true si l'email est parti
pub async fn deliver(
    mailer: &dyn Mailer,
    email: &OutgoingEmail,
    max_retries: u32,
    retry_backoff: Duration,
) -> bool {
    let mut attempt = 0;

    loop {
        match mailer.send(email).await {
            Ok(()) => {
                log::info!("Email {} sent to {}", email.template, email.to);
                return true;
            }
            Err(e) if attempt < max_retries => {
                attempt += 1;
                log::warn!(
                    "Email {} to {} failed ({}), retry {}/{} in {:?}",
                    email.template,
                    email.to,
                    e,
                    attempt,
                    max_retries,
                    retry_backoff
                );
                tokio::time::sleep(retry_backoff).await;
            }
            Err(e) => {
                log::error!(
                    "Giving up on email {} to {} after {} retries: {}",
                    email.template,
                    email.to,
                    max_retries,
                    e
                );
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Échoue les `failures` premiers envois
    struct FlakyMailer {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, _email: &OutgoingEmail) -> Result<(), MailError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(MailError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn sample_email() -> OutgoingEmail {
        OutgoingEmail {
            template: "password_reset",
            to: "alice@example.com".to_string(),
            subject: "Password Reset".to_string(),
            html_body: "<p>hi</p>".to_string(),
            text_body: "hi".to_string(),
        }
    }

    #[tokio::test]
    async fn test_deliver_retries_then_succeeds() {
        let mailer = FlakyMailer {
            failures: 2,
            calls: AtomicU32::new(0),
        };

        let sent = deliver(&mailer, &sample_email(), 3, Duration::ZERO).await;

        assert!(sent);
        assert_eq!(mailer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_deliver_gives_up_after_max_retries() {
        let mailer = FlakyMailer {
            failures: 10,
            calls: AtomicU32::new(0),
        };

        let sent = deliver(&mailer, &sample_email(), 3, Duration::ZERO).await;

        assert!(!sent);
        assert_eq!(mailer.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_dispatch_reaches_mailer() {
        let recorder = Arc::new(RecordingMailer::new());
        let dispatcher = EmailDispatcher::new(recorder.clone(), 0, Duration::ZERO);

        dispatcher.dispatch(
            "bob@example.com",
            &InstructorApprovedEmail {
                user_name: "Bob".to_string(),
                site_name: "Learning Platform".to_string(),
                site_url: "http://localhost:3000".to_string(),
                dashboard_url: "http://localhost:3000/instructor/dashboard".to_string(),
            },
        );

        let email = recorder
            .wait_for("instructor_approved", "bob@example.com")
            .await
            .expect("email should be recorded");
        assert_eq!(email.subject, "Instructor Request Approved - Learning Platform");
        assert!(email.text_body.contains("Bob"));
    }
}
