// src/notify/mod.rs
pub mod email;

use anyhow::Result;

/// Outgoing-mail boundary. Implementations wrap transport and auth failures
/// with context; nothing past this trait panics on a failed send.
#[async_trait::async_trait]
pub trait MailDispatcher: Send + Sync {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<()>;
}

pub use self::email::SmtpDispatcher;
