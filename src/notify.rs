use crate::config::SmtpConfig;
use crate::models::{Source, Submission};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("could not build message: {0}")]
    Build(String),
    #[error("smtp transport failed: {0}")]
    Transport(String),
}

/// Delivers the final pipeline result back to the submitter. Only the email
/// channel is wired; chat and web acknowledgements are logged no-ops.
pub struct Notifier {
    smtp: Option<SmtpConfig>,
}

impl Notifier {
    pub fn new(smtp: Option<SmtpConfig>) -> Self {
        Self { smtp }
    }

    /// Best-effort delivery; returns whether a message actually went out.
    /// Failures are logged and swallowed, the pipeline response does not
    /// change based on notification outcome.
    pub async fn deliver(&self, submission: &Submission, message: &str) -> bool {
        match submission.source {
            Source::Email => {
                let Some(config) = &self.smtp else {
                    warn!(
                        target = "hawker.notify",
                        recipient = %submission.user_id,
                        "smtp not configured, dropping email notification"
                    );
                    return false;
                };
                match send_email(config, &submission.user_id, message).await {
                    Ok(()) => {
                        info!(
                            target = "hawker.notify",
                            recipient = %submission.user_id,
                            "notification email sent"
                        );
                        true
                    }
                    Err(err) => {
                        warn!(
                            target = "hawker.notify",
                            recipient = %submission.user_id,
                            error = %err,
                            "notification email failed"
                        );
                        false
                    }
                }
            }
            Source::Chat | Source::WebForm => {
                debug!(
                    target = "hawker.notify",
                    source = ?submission.source,
                    "no notification channel wired for source"
                );
                false
            }
        }
    }
}

async fn send_email(config: &SmtpConfig, to: &str, body: &str) -> Result<(), NotifyError> {
    let email = Message::builder()
        .from(
            config
                .from
                .parse()
                .map_err(|err: lettre::address::AddressError| NotifyError::Address(err.to_string()))?,
        )
        .to(to
            .parse()
            .map_err(|err: lettre::address::AddressError| NotifyError::Address(err.to_string()))?)
        .subject("Your marketplace listing")
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|err| NotifyError::Build(err.to_string()))?;

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        .map_err(|err| NotifyError::Transport(err.to_string()))?
        .port(config.port);
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }
    let mailer = builder.build();

    mailer
        .send(email)
        .await
        .map(|_| ())
        .map_err(|err| NotifyError::Transport(err.to_string()))
}
