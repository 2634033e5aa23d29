//! SMTP submission through `lettre`.

use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{SmtpTransport, Transport};
use tracing::{debug, info};

use super::{MailSender, SendEnvelope};
use crate::errors::TransportError;
use crate::mime::{write_message, Address, MimeMessage, WriteOptions};

/// Sends through the server named by the message session
/// (`mail.smtp.host`, `mail.smtp.port`, `mail.smtp.starttls.enable`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpSender;

impl SmtpSender {
    /// Creates a sender.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn transport(message: &MimeMessage, envelope: &SendEnvelope) -> Result<SmtpTransport, TransportError> {
        let session = message.session();
        let host = session
            .smtp_host()
            .ok_or_else(|| TransportError::Connection("mail.smtp.host is not set".to_string()))?;

        let mut builder = if session.starttls() {
            SmtpTransport::starttls_relay(host).map_err(|e| TransportError::Connection(e.to_string()))?
        } else {
            SmtpTransport::builder_dangerous(host)
        };
        if let Some(port) = session.smtp_port() {
            builder = builder.port(port);
        }
        if let Some(credentials) = &envelope.credentials {
            builder = builder.credentials(SmtpCredentials::new(
                credentials.user.clone(),
                credentials.password.clone(),
            ));
        }
        debug!(host, starttls = session.starttls(), "Built SMTP transport");
        Ok(builder.build())
    }
}

fn lettre_address(address: &Address) -> Result<lettre::Address, TransportError> {
    address
        .email
        .parse()
        .map_err(|e| TransportError::Rejected(format!("'{}': {e}", address.email)))
}

/// Reply codes a server uses to refuse or demand authentication (RFC 4954).
const AUTH_FAILURE_CODES: [u16; 5] = [454, 530, 534, 535, 538];

fn classify_failure(code: Option<u16>, permanent: bool, client: bool, detail: String) -> TransportError {
    if code.is_some_and(|c| AUTH_FAILURE_CODES.contains(&c)) {
        TransportError::Authentication(detail)
    } else if permanent {
        TransportError::Rejected(detail)
    } else if client {
        TransportError::Protocol(detail)
    } else {
        TransportError::Connection(detail)
    }
}

impl MailSender for SmtpSender {
    fn send(&self, message: &MimeMessage, envelope: &SendEnvelope) -> Result<(), TransportError> {
        let sender = envelope.sender.as_ref().map(lettre_address).transpose()?;
        let recipients = envelope
            .recipients
            .iter()
            .map(lettre_address)
            .collect::<Result<Vec<_>, _>>()?;
        let smtp_envelope =
            Envelope::new(sender, recipients).map_err(|e| TransportError::Rejected(e.to_string()))?;

        let transport = Self::transport(message, envelope)?;
        let bytes = write_message(message, &WriteOptions::for_submission());

        transport.send_raw(&smtp_envelope, &bytes).map_err(|e| {
            let code = e.status().and_then(|code| code.to_string().parse().ok());
            classify_failure(code, e.is_permanent(), e.is_client(), e.to_string())
        })?;

        info!(
            message_id = message.message_id().unwrap_or("-"),
            recipients = envelope.recipients.len(),
            "Sent message"
        );
        Ok(())
    }
}
