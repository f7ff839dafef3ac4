use crate::config::SmtpConfig;
use actix_web::error::BlockingError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Could not build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("Mail task failed: {0}")]
    Blocking(String),
}

impl From<BlockingError> for MailError {
    fn from(err: BlockingError) -> Self {
        MailError::Blocking(err.to_string())
    }
}

/// A submission of the public contact form.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

/// Delivers contact messages to the site operator. Implementations block.
pub trait Mailer: Send + Sync {
    fn send_contact_message(&self, msg: &ContactMessage) -> Result<(), MailError>;
}

pub fn compose_body(msg: &ContactMessage) -> String {
    format!(
        "Name: {}\nEmail: {}\nPhone: {}\nMessage:{}",
        msg.name, msg.email, msg.phone, msg.message
    )
}

/// The operator writes to themselves; replies go to the visitor.
pub fn build_message(own_mailbox: &Mailbox, msg: &ContactMessage) -> Result<Message, MailError> {
    let reply_to = Mailbox::new(Some(msg.name.clone()), msg.email.parse::<Address>()?);
    let message = Message::builder()
        .from(own_mailbox.clone())
        .to(own_mailbox.clone())
        .reply_to(reply_to)
        .subject("New Message")
        .header(ContentType::TEXT_PLAIN)
        .body(compose_body(msg))?;
    Ok(message)
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    own_mailbox: Mailbox,
}

impl SmtpMailer {
    /// STARTTLS relay with login credentials and a bounded connect/IO timeout.
    pub fn from_config(smtp: &SmtpConfig, own_email: &str, own_password: &str) -> Result<Self, MailError> {
        let own_mailbox = Mailbox::new(None, own_email.parse::<Address>()?);
        let transport = SmtpTransport::starttls_relay(&smtp.host)?
            .port(smtp.port)
            .credentials(Credentials::new(own_email.to_string(), own_password.to_string()))
            .timeout(Some(Duration::from_secs(smtp.timeout_secs)))
            .build();
        Ok(SmtpMailer { transport, own_mailbox })
    }
}

impl Mailer for SmtpMailer {
    fn send_contact_message(&self, msg: &ContactMessage) -> Result<(), MailError> {
        let email = build_message(&self.own_mailbox, msg)?;
        self.transport.send(&email)?;
        log::info!("Contact message from '{}' relayed to operator mailbox.", msg.email);
        Ok(())
    }
}
