use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::info;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_email(&self, to: &str, reset_link: &str) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .port(config.port)
            .build();
        let from: Mailbox = format!("Tradepost <{}>", config.username).parse()?;
        Ok(Self { transport, from })
    }
}

fn reset_email_body(reset_link: &str) -> String {
    format!(
        "Hello,\n\
        \n\
        A password reset was requested for your Tradepost account.\n\
        Click the link below to choose a new password:\n\
        \n\
        {}\n\
        \n\
        The link expires in 30 minutes. If you did not request this reset,\n\
        you can safely ignore this email.",
        reset_link
    )
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_reset_email(&self, to: &str, reset_link: &str) -> Result<(), MailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject("Reset your Tradepost password")
            .header(ContentType::TEXT_PLAIN)
            .body(reset_email_body(reset_link))?;

        self.transport.send(email).await?;
        info!(%to, "reset email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_contains_link_and_expiry_notice() {
        let link = "https://shop.example.com/reset-password?token=abc";
        let body = reset_email_body(link);
        assert!(body.contains(link));
        assert!(body.contains("expires in 30 minutes"));
        assert!(body.contains("ignore this email"));
    }

    #[test]
    fn body_does_not_leak_credentials() {
        let body = reset_email_body("https://x/reset-password?token=t");
        assert!(!body.to_lowercase().contains("password:"));
    }
}
