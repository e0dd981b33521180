//! On-demand test of the mailer and its configuration.
//!
//! Sends a fixed test message to the given recipients, resolving the
//! transport settings from `MAILOUT_*` environment variables:
//!
//! - `MAILOUT_TRANSPORT`: `sendmail` (default) or `SMTP`
//! - `MAILOUT_USER`: username and default "From" address
//! - `MAILOUT_SERVER`, `MAILOUT_PORT`, `MAILOUT_PASSWORD`,
//!   `MAILOUT_SECURITY`: SMTP settings

use std::env;

use mailout::{
    send_with_logger, MailerError, Message, SendmailConfig, SmtpConfig, StdoutLogger,
    TransportConfig, TransportKind,
};

fn main() {
    env_logger::init();

    let recipients: Vec<String> = env::args().skip(1).collect();
    if recipients.is_empty() {
        eprintln!("usage: mailout RECIPIENT [RECIPIENT ...]");
        std::process::exit(2);
    }

    let config = match config_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("bad configuration: {e}");
            std::process::exit(1);
        }
    };

    let doc = format!(
        "Test the email sender from mailout {}",
        env!("CARGO_PKG_VERSION")
    );
    println!("{doc}");
    println!("Sending email(s) to: {}", recipients.join(" "));
    println!("mail transfer agent: {}", config.kind());

    let subject = format!("mailout test message: {}", config.kind());
    let message = Message::new(subject, doc, recipients);

    if let Err(e) = send_with_logger(&message, &config, &StdoutLogger) {
        eprintln!("failed to send: {e}");
        std::process::exit(1);
    }
}

/// Resolve a transport configuration from the environment. The
/// thinnest possible stand-in for a real configuration source.
fn config_from_env() -> Result<TransportConfig, MailerError> {
    let kind: TransportKind = env::var("MAILOUT_TRANSPORT")
        .unwrap_or_else(|_| "sendmail".to_string())
        .parse()?;
    let user = env::var("MAILOUT_USER").unwrap_or_default();

    Ok(match kind {
        TransportKind::Sendmail => TransportConfig::Sendmail(SendmailConfig { user }),
        TransportKind::Smtp => TransportConfig::Smtp(SmtpConfig {
            server: env::var("MAILOUT_SERVER").unwrap_or_default(),
            user,
            port: env::var("MAILOUT_PORT").ok().and_then(|p| p.parse().ok()),
            password: env::var("MAILOUT_PASSWORD").ok(),
            connection_security: env::var("MAILOUT_SECURITY").ok(),
        }),
    })
}
