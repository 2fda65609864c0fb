use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use sightline_common::config::SmtpConfig;

use super::{EmailSender, MailError, MailTemplates};

/// SMTP delivery via a pooled async transport
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    templates: Arc<MailTemplates>,
}

impl SmtpEmailSender {
    pub fn new(config: &SmtpConfig, templates: Arc<MailTemplates>) -> Result<Self, MailError> {
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|e| MailError::Address(format!("sender '{}': {}", config.sender, e)))?;

        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Transport(format!("SMTP relay configuration error: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_millis(config.timeout_ms)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
            templates,
        })
    }

    fn build_message(
        &self,
        recipient_email: &str,
        template_name: &str,
        data: &serde_json::Value,
    ) -> Result<Message, MailError> {
        let to: Mailbox = recipient_email
            .parse()
            .map_err(|e| MailError::Address(format!("'{}': {}", recipient_email, e)))?;
        let rendered = self.templates.render(template_name, data)?;

        Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(rendered.subject)
            .multipart(MultiPart::alternative_plain_html(rendered.plain, rendered.html))
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(
        &self,
        recipient_email: &str,
        template_name: &str,
        data: &serde_json::Value,
    ) -> Result<(), MailError> {
        let message = self.build_message(recipient_email, template_name, data)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        debug!(recipient = recipient_email, code = %response.code(), "SMTP accepted message");
        Ok(())
    }
}
