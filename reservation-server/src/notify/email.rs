//! Email receipts

use async_trait::async_trait;
use aws_sdk_sesv2::Client as SesClient;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use shared::models::ReservationSnapshot;

use super::NotifyError;

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_receipt(&self, snapshot: &ReservationSnapshot) -> Result<(), NotifyError>;

    fn name(&self) -> &'static str;
}

/// Receipt subject and plain-text body
pub fn render_receipt(snapshot: &ReservationSnapshot) -> (String, String) {
    let subject = format!("Reservation confirmed: {} {}", snapshot.date, snapshot.time);
    let body = format!(
        "Dear {name},\n\n\
         Your table is reserved.\n\n\
         Date: {date}\n\
         Time: {time}\n\
         Guests: {party} ({adults} adults, {children} children)\n\
         Phone: {phone}\n\
         Notes: {notes}\n\n\
         We look forward to seeing you.",
        name = snapshot.name,
        date = snapshot.date,
        time = snapshot.time,
        party = snapshot.party_size,
        adults = snapshot.adults,
        children = snapshot.children,
        phone = snapshot.phone,
        notes = snapshot.notes,
    );
    (subject, body)
}

/// AWS SES v2 sender
pub struct SesEmailSender {
    ses: SesClient,
    from: String,
}

impl SesEmailSender {
    pub fn new(ses: SesClient, from: impl Into<String>) -> Self {
        Self {
            ses,
            from: from.into(),
        }
    }

    /// Build a client from the default AWS configuration chain
    pub async fn from_env(from: impl Into<String>) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let ses = if let Ok(ses_region) = std::env::var("SES_REGION") {
            let ses_config = aws_config
                .to_builder()
                .region(aws_config::Region::new(ses_region))
                .build();
            SesClient::new(&ses_config)
        } else {
            SesClient::new(&aws_config)
        };
        Self::new(ses, from)
    }
}

#[async_trait]
impl EmailSender for SesEmailSender {
    async fn send_receipt(&self, snapshot: &ReservationSnapshot) -> Result<(), NotifyError> {
        let (subject, body_text) = render_receipt(snapshot);

        let subject = Content::builder()
            .data(subject)
            .build()
            .map_err(|e| NotifyError::Email(e.to_string()))?;
        let text = Content::builder()
            .data(body_text)
            .build()
            .map_err(|e| NotifyError::Email(e.to_string()))?;
        let body = Body::builder().text(text).build();
        let message = Message::builder().subject(subject).body(body).build();

        self.ses
            .send_email()
            .from_email_address(&self.from)
            .destination(Destination::builder().to_addresses(&snapshot.email).build())
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| NotifyError::Email(e.to_string()))?;

        tracing::info!(to = %snapshot.email, date = %snapshot.date, time = %snapshot.time, "Receipt email sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ses"
    }
}

/// Sender used when SES is disabled: records the receipt in the log only
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_receipt(&self, snapshot: &ReservationSnapshot) -> Result<(), NotifyError> {
        let (subject, _) = render_receipt(snapshot);
        tracing::info!(to = %snapshot.email, subject = %subject, "Receipt email (SES disabled)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
