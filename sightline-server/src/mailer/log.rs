use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{EmailSender, MailError, MailTemplates};

/// Renders messages and writes them to the log instead of sending them
///
/// Used when no SMTP relay is configured.
pub struct LogEmailSender {
    templates: Arc<MailTemplates>,
}

impl LogEmailSender {
    pub fn new(templates: Arc<MailTemplates>) -> Self {
        Self { templates }
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(
        &self,
        recipient_email: &str,
        template_name: &str,
        data: &serde_json::Value,
    ) -> Result<(), MailError> {
        let message = self.templates.render(template_name, data)?;
        info!(
            recipient = recipient_email,
            subject = %message.subject,
            "Notification (log only):\n{}",
            message.plain
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_log_sender_renders() {
        let sender = LogEmailSender::new(Arc::new(MailTemplates::builtin().unwrap()));
        let data = json!({
            "recipient_name": "Ana",
            "animal_id": "a",
            "sighting_id": "s",
            "observed_at": "2026-01-01T00:00:00+00:00",
            "latitude": 1.0,
            "longitude": 2.0,
        });
        sender.send("ana@example.org", "sighting_notification", &data).await.unwrap();

        let err = sender.send("ana@example.org", "missing", &data).await.unwrap_err();
        assert!(matches!(err, MailError::Template(_)));
    }
}
