//! Transport selection
//!
//! One entry point for both delivery strategies: the configuration
//! variant picks the transport, everything else is delegated.

use crate::config::TransportConfig;
use crate::error::MailerError;
use crate::logger::{Logger, NullLogger};
use crate::message::Message;
use crate::sendmail::SendmailTransport;
use crate::smtp::SmtpTransport;

/// Send `message` through the configured transport.
pub fn send(message: &Message, config: &TransportConfig) -> Result<(), MailerError> {
    send_with_logger(message, config, &NullLogger)
}

/// Send `message` through the configured transport, reporting
/// diagnostic lines to `logger`. A failure is logged before it is
/// propagated; nothing is retried.
pub fn send_with_logger(
    message: &Message,
    config: &TransportConfig,
    logger: &dyn Logger,
) -> Result<(), MailerError> {
    let result = dispatch(message, config, logger);
    if let Err(e) = &result {
        logger.log(&format!("send failed: {e}"));
    }
    result
}

fn dispatch(
    message: &Message,
    config: &TransportConfig,
    logger: &dyn Logger,
) -> Result<(), MailerError> {
    message.validate()?;
    match config {
        TransportConfig::Sendmail(sendmail) => {
            SendmailTransport::new().send(message, sendmail, logger)
        }
        TransportConfig::Smtp(smtp) => SmtpTransport::new().send(message, smtp, logger),
    }
}
