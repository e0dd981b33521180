//! Error types for the mail transports

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A recipient refused by the SMTP server during the RCPT stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecipient {
    /// The refused address.
    pub address: String,
    /// The SMTP reply code (e.g. 550).
    pub code: u16,
    /// The server's reply text.
    pub reason: String,
}

impl fmt::Display for RejectedRecipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.address, self.code, self.reason)
    }
}

/// Everything that can go wrong during a single send.
///
/// Every variant is terminal for the call: nothing is retried or
/// recovered internally.
#[derive(Error, Debug)]
pub enum MailerError {
    #[error("cannot use the sendmail transport on platform {platform:?}")]
    UnsupportedPlatform { platform: &'static str },

    #[error("cannot find a mail transfer agent for sendmail")]
    NoTransportAgent,

    #[error("delivery through a generic mail program is not supported: {}", .program.display())]
    UnimplementedTransport { program: PathBuf },

    #[error("mail command failed: {command}")]
    Process {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("must define an SMTP host to be used")]
    MissingHost,

    #[error("must define a username for the SMTP server")]
    MissingUser,

    #[error("connection_security must be STARTTLS or not defined, found: {0}")]
    InvalidSecurityMode(String),

    #[error("SMTP connection failed: {0}")]
    Connection(String),

    #[error("SMTP authentication failed: {0}")]
    Authentication(String),

    #[error("recipient(s) refused by the SMTP server: {}", join_rejected(.rejected))]
    Delivery { rejected: Vec<RejectedRecipient> },

    #[error("{command} refused by the SMTP server: {code} {reason}")]
    Protocol {
        command: String,
        code: u16,
        reason: String,
    },

    #[error("unknown mail transport: {0}")]
    UnknownTransport(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

fn join_rejected(rejected: &[RejectedRecipient]) -> String {
    rejected
        .iter()
        .map(RejectedRecipient::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_recipient_display() {
        let rejected = RejectedRecipient {
            address: "nobody@example.com".to_string(),
            code: 550,
            reason: "User unknown".to_string(),
        };
        assert_eq!(rejected.to_string(), "nobody@example.com (550 User unknown)");
    }

    #[test]
    fn test_delivery_error_lists_all_rejected() {
        let err = MailerError::Delivery {
            rejected: vec![
                RejectedRecipient {
                    address: "a@example.com".to_string(),
                    code: 550,
                    reason: "User unknown".to_string(),
                },
                RejectedRecipient {
                    address: "b@example.com".to_string(),
                    code: 552,
                    reason: "Mailbox full".to_string(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("a@example.com (550 User unknown)"));
        assert!(text.contains("b@example.com (552 Mailbox full)"));
    }

    #[test]
    fn test_process_error_carries_command() {
        let err = MailerError::Process {
            command: "cat << +++ | /usr/lib/sendmail".to_string(),
            source: std::io::Error::other("spawn failed"),
        };
        assert!(err.to_string().contains("/usr/lib/sendmail"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unknown_transport_names_the_kind() {
        let err = MailerError::UnknownTransport("carrier-pigeon".to_string());
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
