//! SMTP transport

mod client;
mod reply;

pub use client::SMTP_TIMEOUT;

use crate::config::SmtpConfig;
use crate::error::MailerError;
use crate::logger::Logger;
use crate::message::Message;

use client::SmtpClient;

/// Protocol default port, used when the configuration names none.
const DEFAULT_PORT: u16 = 25;

/// Recognized values of the `connection_security` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SecurityMode {
    None,
    StartTls,
}

impl SecurityMode {
    /// `STARTTLS` is the only mode besides "not defined"; anything
    /// else is refused before a connection is opened.
    fn parse(value: Option<&str>) -> Result<Self, MailerError> {
        match value {
            None => Ok(Self::None),
            Some("STARTTLS") => Ok(Self::StartTls),
            Some(other) => Err(MailerError::InvalidSecurityMode(other.to_string())),
        }
    }
}

/// Delivers mail over a direct SMTP session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpTransport;

impl SmtpTransport {
    pub fn new() -> Self {
        Self
    }

    /// Send `message` through the configured SMTP server.
    ///
    /// Configuration is validated before any connection is opened.
    /// The session is connect, EHLO, optional STARTTLS upgrade (with a
    /// second EHLO), optional authentication, MAIL/RCPT/DATA, QUIT.
    pub fn send(
        &self,
        message: &Message,
        config: &SmtpConfig,
        logger: &dyn Logger,
    ) -> Result<(), MailerError> {
        if config.server.is_empty() {
            return Err(MailerError::MissingHost);
        }
        if config.user.is_empty() {
            return Err(MailerError::MissingUser);
        }
        let sender = message.sender_or(&config.user).to_string();
        let security = SecurityMode::parse(config.connection_security.as_deref())?;
        let envelope = build_envelope(&sender, message);

        logger.log(&format!("sending email to: {:?}", message.recipients));
        logger.log(&format!("SMTP server: {}", config.server));
        logger.log(&format!("SMTP user: {}", config.user));
        logger.log(&format!("email From: {sender}"));

        let mut client = SmtpClient::connect(&config.server, config.port.unwrap_or(DEFAULT_PORT))?;
        logger.log("SMTP connected");

        client.ehlo()?;
        if security == SecurityMode::StartTls {
            client.starttls()?;
            client.ehlo()?;
            logger.log("SMTP STARTTLS");
        }

        if let Some(password) = config.password.as_deref() {
            client.authenticate(&config.user, password)?;
            logger.log("SMTP authenticated");
        }

        client.send_envelope(&sender, &message.recipients, &envelope)?;
        client.quit();
        logger.log("SMTP complete");
        Ok(())
    }
}

/// One `To:` header per recipient in input order, then `From:`,
/// `Subject:`, a blank separator and the body.
fn build_envelope(sender: &str, message: &Message) -> String {
    let mut lines = Vec::with_capacity(message.recipients.len() + 4);
    for who in &message.recipients {
        lines.push(format!("To: {who}"));
    }
    lines.push(format!("From: {sender}"));
    lines.push(format!("Subject: {}", message.subject));
    lines.push(String::new());
    lines.push(message.body.clone());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NullLogger;

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            server: "127.0.0.1".to_string(),
            user: "operator".to_string(),
            port: Some(1),
            password: None,
            connection_security: None,
        }
    }

    #[test]
    fn test_envelope_layout() {
        let message = Message::new(
            "S",
            "B",
            vec!["a@x.com".to_string(), "b@x.com".to_string()],
        );
        let envelope = build_envelope("u", &message);
        assert_eq!(envelope, "To: a@x.com\nTo: b@x.com\nFrom: u\nSubject: S\n\nB");
    }

    #[test]
    fn test_envelope_single_string_matches_list() {
        let single = Message::new("S", "B", "a@x.com");
        let list = Message::new("S", "B", vec!["a@x.com".to_string()]);
        assert_eq!(build_envelope("u", &single), build_envelope("u", &list));
    }

    #[test]
    fn test_security_mode_parse() {
        assert_eq!(SecurityMode::parse(None).unwrap(), SecurityMode::None);
        assert_eq!(
            SecurityMode::parse(Some("STARTTLS")).unwrap(),
            SecurityMode::StartTls
        );
        let err = SecurityMode::parse(Some("SSL")).unwrap_err();
        assert!(matches!(err, MailerError::InvalidSecurityMode(v) if v == "SSL"));
    }

    #[test]
    fn test_missing_host_checked_first() {
        let mut config = smtp_config();
        config.server.clear();
        config.user.clear();
        let message = Message::new("S", "B", "a@x.com");
        let err = SmtpTransport::new()
            .send(&message, &config, &NullLogger)
            .unwrap_err();
        assert!(matches!(err, MailerError::MissingHost));
    }

    #[test]
    fn test_missing_user_before_any_connection() {
        let mut config = smtp_config();
        config.user.clear();
        let message = Message::new("S", "B", "a@x.com");
        let err = SmtpTransport::new()
            .send(&message, &config, &NullLogger)
            .unwrap_err();
        assert!(matches!(err, MailerError::MissingUser));
    }

    #[test]
    fn test_invalid_security_before_any_connection() {
        // Port 1 would yield a Connection error if the transport ever
        // got that far; the security check must win.
        let mut config = smtp_config();
        config.connection_security = Some("SSL".to_string());
        let message = Message::new("S", "B", "a@x.com");
        let err = SmtpTransport::new()
            .send(&message, &config, &NullLogger)
            .unwrap_err();
        assert!(matches!(err, MailerError::InvalidSecurityMode(_)));
    }
}
