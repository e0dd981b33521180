//! # mailout
//!
//! Send a message by email to one or more recipients, by SMTP or a
//! local sendmail-style program.
//!
//! The transport is picked by the configuration: a
//! [`TransportConfig::Sendmail`] pipes the message into the first
//! mail-transfer agent found on the local filesystem, a
//! [`TransportConfig::Smtp`] opens a direct SMTP session (optionally
//! upgraded with STARTTLS, optionally authenticated). Either way the
//! call is synchronous, single-shot and never retried.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mailout::{send, Message, SmtpConfig, TransportConfig};
//!
//! let message = Message::new(
//!     "sensor out of range",
//!     "The water level moved outside its alarm limits.",
//!     vec!["joe@example.com".to_string(), "sally@example.org".to_string()],
//! );
//!
//! let config = TransportConfig::Smtp(SmtpConfig {
//!     server: "smtp.example.com".to_string(),
//!     user: "operator".to_string(),
//!     port: Some(587),
//!     password: Some("hunter2".to_string()),
//!     connection_security: Some("STARTTLS".to_string()),
//! });
//!
//! send(&message, &config).expect("delivery failed");
//! ```
//!
//! ## Diagnostics
//!
//! Every send accepts an optional [`Logger`] sink which receives
//! plain-text milestones (connected, authenticated, sent). Pass
//! [`StdoutLogger`] to watch a send, or collect the lines with
//! [`MemoryLogger`]. Protocol-level tracing additionally goes through
//! the `log` facade at debug level.
//!
//! ## Notes
//!
//! - The sendmail transport is Linux-only and spawns the delivery
//!   process without waiting for it.
//! - The SMTP transport bounds connecting and every socket operation
//!   to a fixed 10-second timeout.
//! - A refused recipient aborts the whole SMTP transaction; there is
//!   no partial delivery.

mod config;
mod error;
mod logger;
mod mailer;
mod message;
mod sendmail;
mod smtp;

pub use config::{SendmailConfig, SmtpConfig, TransportConfig, TransportKind};
pub use error::{MailerError, RejectedRecipient};
pub use logger::{Logger, MemoryLogger, NullLogger, StdoutLogger};
pub use mailer::{send, send_with_logger};
pub use message::{Message, Recipients};
pub use sendmail::{MtaCandidate, MtaKind, SendmailTransport};
pub use smtp::{SmtpTransport, SMTP_TIMEOUT};
