use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::debug;

use super::notifier::Notifier;
use crate::configuration::types::{SmtpConfig, SmtpSecurity};
use crate::error_handling::types::{ConfigError, NotifyError};

/// Sends notifications as plain-text e-mail through an authenticated SMTP relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

fn parse_mailbox(address: &str) -> Result<Mailbox, ConfigError> {
    address.parse().map_err(|e: lettre::address::AddressError| ConfigError::BadAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

impl SmtpNotifier {
    /// Builds the transport. No connection is made until the first message.
    ///
    /// `timeout` bounds every network operation of a send.
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let from = parse_mailbox(&config.sender)?;
        let to = parse_mailbox(&config.recipient)?;

        let builder = match config.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server),
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            }
        }
        .map_err(|e| ConfigError::BadAddress {
            address: config.server.clone(),
            reason: e.to_string(),
        })?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.sender.clone(), config.password.clone()))
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport, from, to })
    }
}

impl Notifier for SmtpNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::BuildFailed(e.to_string()))?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        debug!("SMTP relay answered {:?}", response.code());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            server: "smtp.example.com".into(),
            port: 465,
            sender: "monitor@example.com".into(),
            password: "secret".into(),
            recipient: "admin@example.com".into(),
            security: SmtpSecurity::Tls,
        }
    }

    #[test]
    fn test_bad_sender_is_a_config_error() {
        let cfg = SmtpConfig { sender: "not an address".into(), ..config() };
        let err = SmtpNotifier::new(&cfg, Duration::from_secs(5)).err().unwrap();
        assert!(matches!(
            err,
            ConfigError::BadAddress { ref address, .. } if address == "not an address"
        ));
    }

    #[test]
    fn test_bad_recipient_is_a_config_error() {
        let cfg = SmtpConfig { recipient: "@".into(), ..config() };
        assert!(SmtpNotifier::new(&cfg, Duration::from_secs(5)).is_err());
    }
}
