//! Outgoing mail
//!
//! [`EmailSender`] is the seam the notification consumer dispatches
//! through. Messages are rendered from handlebars templates embedded in
//! the binary; each template name `<name>` has three parts:
//! `<name>.subject.hbs`, `<name>.txt.hbs` and `<name>.html.hbs`.

mod log;
mod smtp;
mod templates;

pub use self::log::LogEmailSender;
pub use self::smtp::SmtpEmailSender;
pub use self::templates::{MailTemplates, RenderedMessage};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("template error: {0}")]
    Template(String),

    #[error("invalid address: {0}")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("delivery timed out")]
    Timeout,
}

/// Delivers one templated message to one recipient
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        recipient_email: &str,
        template_name: &str,
        data: &serde_json::Value,
    ) -> Result<(), MailError>;
}
