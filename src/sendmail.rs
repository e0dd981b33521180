//! Local mail-transfer-agent transport
//!
//! Delivers mail by piping an RFC-822-ish payload into a sendmail
//! program found on the local filesystem.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::config::SendmailConfig;
use crate::error::MailerError;
use crate::logger::Logger;
use crate::message::Message;

/// How a candidate program expects to be driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MtaKind {
    /// sendmail-compatible: `-F <sender> -t <recipients>` flags, the
    /// message piped in on standard input.
    Sendmail,
    /// A plain `mail` binary. Recognized but not supported.
    Mail,
}

/// One entry in the ordered probe table.
#[derive(Debug, Clone)]
pub struct MtaCandidate {
    path: PathBuf,
    kind: MtaKind,
}

impl MtaCandidate {
    pub fn sendmail(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: MtaKind::Sendmail,
        }
    }

    pub fn mail(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: MtaKind::Mail,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MtaKind {
        self.kind
    }
}

/// The fixed system probe table. Order encodes preference.
fn default_candidates() -> Vec<MtaCandidate> {
    vec![
        MtaCandidate::sendmail("/usr/lib/sendmail"),
        MtaCandidate::sendmail("/usr/bin/sendmail"),
        MtaCandidate::mail("/usr/bin/mail"),
    ]
}

/// Delivers mail through a local MTA executable (Linux only).
#[derive(Debug, Clone)]
pub struct SendmailTransport {
    candidates: Vec<MtaCandidate>,
}

impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SendmailTransport {
    /// Probe the fixed system paths.
    pub fn new() -> Self {
        Self {
            candidates: default_candidates(),
        }
    }

    /// Probe a custom candidate table instead of the system paths.
    pub fn with_candidates(candidates: Vec<MtaCandidate>) -> Self {
        Self { candidates }
    }

    /// First existing candidate wins. The probe is sequential because
    /// the table order encodes preference.
    fn probe(&self) -> Option<&MtaCandidate> {
        self.candidates.iter().find(|c| c.path.exists())
    }

    /// Send `message` by piping it into the first MTA found.
    ///
    /// The delivery process is spawned detached and not waited on;
    /// success means the process was handed to the operating system.
    pub fn send(
        &self,
        message: &Message,
        config: &SendmailConfig,
        logger: &dyn Logger,
    ) -> Result<(), MailerError> {
        if !cfg!(target_os = "linux") {
            return Err(MailerError::UnsupportedPlatform {
                platform: std::env::consts::OS,
            });
        }

        let sender = message.sender_or(&config.user);
        let candidate = self.probe().ok_or(MailerError::NoTransportAgent)?;
        let (mail_command, command) = match candidate.kind {
            MtaKind::Sendmail => build_command(&candidate.path, sender, message),
            MtaKind::Mail => {
                return Err(MailerError::UnimplementedTransport {
                    program: candidate.path.clone(),
                });
            }
        };

        logger.log(&format!("sending email to: {:?}", message.recipients));
        logger.log(&format!("email program: {}", candidate.path.display()));
        logger.log(&format!("mail command: {mail_command}"));
        logger.log(&format!("email From: {sender}"));
        logger.log(&format!("email command:\n{command}"));

        debug!("spawning {mail_command}");
        let _child = Command::new("/bin/sh")
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| MailerError::Process {
                command: command.clone(),
                source,
            })?;

        logger.log("sendmail sent");
        Ok(())
    }
}

/// One `To:` line per recipient in input order, then `Subject:`, then
/// the body.
fn build_payload(message: &Message) -> String {
    let mut lines = Vec::with_capacity(message.recipients.len() + 2);
    for who in &message.recipients {
        lines.push(format!("To: {who}"));
    }
    lines.push(format!("Subject: {}", message.subject));
    lines.push(message.body.clone());
    lines.join("\n")
}

/// Build the invocation (`program -F sender -t recipients`) and the
/// full shell pipe that feeds it the payload as a here-document.
fn build_command(program: &Path, sender: &str, message: &Message) -> (String, String) {
    let to_addr = message.recipients.join(" ");
    let mail_command = format!("{} -F {} -t {}", program.display(), sender, to_addr);
    let command = format!("cat << +++ | {mail_command}\n{}\n+++", build_payload(message));
    (mail_command, command)
}
