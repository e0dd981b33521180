//! The outbound message and its recipient handling

use serde::{Deserialize, Serialize};

use crate::error::MailerError;

/// One or more recipient addresses.
///
/// A bare string is treated as a one-element list, so callers with a
/// single address do not have to build a `Vec` by hand:
///
/// ```
/// use mailout::Recipients;
///
/// let one = Recipients::from("joe@example.com");
/// let also_one = Recipients::from(vec!["joe@example.com".to_string()]);
/// assert_eq!(one, also_one);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipients(Vec<String>);

impl Recipients {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for Recipients {
    fn from(address: &str) -> Self {
        Self(vec![address.to_owned()])
    }
}

impl From<String> for Recipients {
    fn from(address: String) -> Self {
        Self(vec![address])
    }
}

impl From<Vec<String>> for Recipients {
    fn from(addresses: Vec<String>) -> Self {
        Self(addresses)
    }
}

impl From<&[&str]> for Recipients {
    fn from(addresses: &[&str]) -> Self {
        Self(addresses.iter().map(|a| (*a).to_owned()).collect())
    }
}

/// A message to be delivered by one of the transports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Short text for the email subject.
    pub subject: String,

    /// Full text of the email body.
    pub body: String,

    /// Addresses to receive the message, in order.
    pub recipients: Vec<String>,

    /// "From" address; when absent the configured user is used.
    pub sender: Option<String>,
}

impl Message {
    /// Create a new message for the given recipients.
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        recipients: impl Into<Recipients>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            recipients: recipients.into().into_vec(),
            sender: None,
        }
    }

    /// Set an explicit "From" address.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Resolve the "From" address against the configured user.
    pub fn sender_or<'a>(&'a self, user: &'a str) -> &'a str {
        self.sender.as_deref().unwrap_or(user)
    }

    /// Check the message invariants before any transport work.
    pub fn validate(&self) -> Result<(), MailerError> {
        if self.recipients.is_empty() {
            return Err(MailerError::InvalidMessage(
                "at least one recipient is required".to_string(),
            ));
        }
        if self.recipients.iter().any(|r| r.is_empty()) {
            return Err(MailerError::InvalidMessage(
                "recipient addresses must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
