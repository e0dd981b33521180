//! Resolved transport configuration
//!
//! Loading (file format, environment, GUI) is the caller's business;
//! this crate only consumes the resolved settings object.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MailerError;

/// The two delivery strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportKind {
    Sendmail,
    Smtp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sendmail => write!(f, "sendmail"),
            Self::Smtp => write!(f, "SMTP"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = MailerError;

    /// Kind strings arrive from the configuration collaborator;
    /// anything unrecognized is refused here, before any transport
    /// work happens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sendmail" => Ok(Self::Sendmail),
            "SMTP" | "smtp" => Ok(Self::Smtp),
            other => Err(MailerError::UnknownTransport(other.to_string())),
        }
    }
}

/// Settings for the local-MTA transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendmailConfig {
    /// Username handed to the sendmail program as the "From" address
    /// when the message carries no explicit sender.
    pub user: String,
}

/// Settings for the SMTP transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server host.
    pub server: String,

    /// Username to login to the SMTP server.
    pub user: String,

    /// SMTP port; the protocol default is used when absent.
    #[serde(default)]
    pub port: Option<u16>,

    /// Password for the username; authentication only happens when
    /// this is present.
    #[serde(default)]
    pub password: Option<String>,

    /// Connection security; `STARTTLS` is the only recognized value.
    /// Kept as the raw configured string so an unrecognized value can
    /// be refused before any connection is opened.
    #[serde(default)]
    pub connection_security: Option<String>,
}

/// A resolved transport choice plus its settings.
///
/// The variant *is* the strategy selection: there is no string lookup
/// at dispatch time. Strings from the collaborator enter through
/// [`TransportKind::from_str`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TransportConfig {
    #[serde(rename = "sendmail")]
    Sendmail(SendmailConfig),
    #[serde(rename = "smtp", alias = "SMTP")]
    Smtp(SmtpConfig),
}

impl TransportConfig {
    /// Which transport this configuration selects.
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::Sendmail(_) => TransportKind::Sendmail,
            Self::Smtp(_) => TransportKind::Smtp,
        }
    }
}
