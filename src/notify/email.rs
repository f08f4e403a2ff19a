//! SMTP notifier backed by lettre.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::MonitoringStatus;
use crate::config::EmailSettings;

use super::{Notify, templates};

/// Sends monitoring notifications over SMTP (STARTTLS).
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(settings: &EmailSettings) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .context("failed to create SMTP transport")?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        let from = settings
            .from
            .parse::<Mailbox>()
            .context("invalid notification sender address")?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Notify for SmtpNotifier {
    async fn send_monitoring_notification(
        &self,
        recipients: &[String],
        status: &MonitoringStatus,
    ) -> Result<()> {
        let subject = if status.running {
            "Domain monitoring started"
        } else {
            "Domain monitoring stopped"
        };
        let body = templates::monitoring_notification(status);

        for recipient in recipients {
            let to = recipient
                .parse::<Mailbox>()
                .with_context(|| format!("invalid recipient address {recipient}"))?;

            let message = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(subject)
                .header(ContentType::TEXT_HTML)
                .body(body.clone())
                .context("failed to build notification mail")?;

            self.transport
                .send(message)
                .await
                .with_context(|| format!("SMTP send to {recipient} failed"))?;

            debug!(%recipient, "notification mail sent");
        }

        Ok(())
    }
}
