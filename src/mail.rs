use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info};

use crate::config::MailConfig;

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl EmailMessage {
    pub fn password_reset(to: &str, reset_url_base: &str, token: &str) -> Self {
        let link = format!("{}?token={}", reset_url_base, token);
        Self {
            to: to.to_string(),
            subject: "FoodLens Password Reset".into(),
            html: format!(
                r#"<p>Click the link below to reset your password:</p><a href="{link}">{link}</a>"#
            ),
        }
    }
}

/// Outbound mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

/// Sends through an authenticated SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, username: &str, password: &str) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("smtp relay {}", host))?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        let from = username
            .parse::<Mailbox>()
            .with_context(|| format!("sender address {}", username))?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        let to = message
            .to
            .parse::<Mailbox>()
            .with_context(|| format!("recipient address {}", message.to))?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(message.html.clone())
            .context("build email")?;
        self.transport.send(email).await.context("smtp send")?;
        debug!(to = %message.to, "email sent");
        Ok(())
    }
}

/// Development sender: logs instead of delivering.
#[derive(Clone, Debug)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.html,
            "email delivery disabled; logging message"
        );
        Ok(())
    }
}

/// Which sender a [`MailConfig`] selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransport {
    Smtp,
    Log,
}

impl MailTransport {
    pub fn for_config(cfg: &MailConfig) -> Self {
        match (&cfg.username, &cfg.password) {
            (Some(_), Some(_)) => MailTransport::Smtp,
            _ => MailTransport::Log,
        }
    }
}

pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match (MailTransport::for_config(cfg), &cfg.username, &cfg.password) {
        (MailTransport::Smtp, Some(user), Some(pass)) => {
            info!(host = %cfg.smtp_host, "reset mails go through smtp");
            Ok(Arc::new(SmtpMailer::new(&cfg.smtp_host, user, pass)?))
        }
        _ => {
            info!("EMAIL_USER/EMAIL_PASS not set; reset mails will be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}
