//! Email service for verification links and order receipts.
//!
//! Uses SMTP via lettre for delivery. Every message is sent as a
//! plain-text/HTML multipart.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    base_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send an email verification link.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or delivered.
    pub async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), EmailError> {
        let verify_url = Self::verification_url(&self.base_url, token);

        let text = format!(
            "Confirm your email address\n\n\
             Open the link below to verify your Pixelfair account:\n\n\
             {verify_url}\n\n\
             The link expires in 24 hours. If you didn't create an account, \
             you can ignore this email.\n"
        );
        let html = format!(
            "<p>Confirm your email address</p>\
             <p>Click the link below to verify your Pixelfair account:</p>\
             <p><a href=\"{verify_url}\">Verify my email</a></p>\
             <p>The link expires in 24 hours. If you didn't create an account, \
             you can ignore this email.</p>"
        );

        self.send_multipart_email(to, "Verify your Pixelfair email", &text, &html)
            .await
    }

    /// Link consumed by `GET /api/auth/verify-email`.
    fn verification_url(base_url: &str, token: &str) -> String {
        format!("{base_url}/api/auth/verify-email?token={token}")
    }

    /// Send an order receipt with its access link.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or delivered.
    pub async fn send_receipt_email(
        &self,
        to: &str,
        buyer_name: &str,
        order_id: i32,
        receipt_token: &str,
    ) -> Result<(), EmailError> {
        let receipt_url = format!("{}/receipt/{receipt_token}", self.base_url);

        let text = format!(
            "Hi {buyer_name},\n\n\
             Thanks for your purchase! Your order #{order_id} is complete.\n\n\
             View your receipt and download your files here:\n\n\
             {receipt_url}\n\n\
             You'll be asked to confirm the email address this receipt was \
             sent to.\n"
        );
        let html = format!(
            "<p>Hi {buyer_name},</p>\
             <p>Thanks for your purchase! Your order #{order_id} is complete.</p>\
             <p><a href=\"{receipt_url}\">View your receipt and downloads</a></p>\
             <p>You'll be asked to confirm the email address this receipt was \
             sent to.</p>"
        );

        self.send_multipart_email(to, &format!("Your Pixelfair receipt for order #{order_id}"), &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Generate an opaque single-use token: a v4 UUID plus 32 random bytes, hex
/// encoded.
#[must_use]
pub fn generate_token() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    format!("{}{}", uuid::Uuid::new_v4().simple(), hex::encode(bytes))
}
