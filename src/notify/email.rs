use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::MailDispatcher;
use crate::config::MailConfig;

/// SMTP mail dispatcher: STARTTLS relay on the configured host/port, sender
/// credentials from config, recipient supplied per call.
pub struct SmtpDispatcher {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpDispatcher {
    pub fn from_config(cfg: &MailConfig) -> Result<Self> {
        let creds = Credentials::new(cfg.sender.clone(), cfg.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .with_context(|| format!("invalid SMTP relay host {}", cfg.host))?
            .port(cfg.port)
            .credentials(creds)
            .build();
        let from = cfg
            .sender
            .parse()
            .with_context(|| format!("invalid sender address {}", cfg.sender))?;
        Ok(Self { mailer, from })
    }
}

#[async_trait::async_trait]
impl MailDispatcher for SmtpDispatcher {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()> {
        let to: Mailbox = recipient
            .parse()
            .with_context(|| format!("invalid recipient address {recipient}"))?;
        let msg = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("build email")?;
        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }
}
