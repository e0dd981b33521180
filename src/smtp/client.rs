//! Blocking SMTP protocol engine
//!
//! Handles the TCP connection, STARTTLS upgrade, EHLO/HELO
//! negotiation, authentication and the MAIL/RCPT/DATA exchange.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, info};

use crate::error::{MailerError, RejectedRecipient};
use crate::smtp::reply::{EhloCapabilities, SmtpReply};

/// Fixed bound for connecting and for each socket read/write.
pub const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Domain announced in EHLO/HELO.
const CLIENT_DOMAIN: &str = "localhost";

/// Plain-text or TLS socket, so the rest of the engine is generic.
enum SmtpStream {
    Plain(TcpStream),
    Tls(Box<rustls::StreamOwned<rustls::ClientConnection, TcpStream>>),
}

impl Read for SmtpStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for SmtpStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

/// A single blocking SMTP session.
pub(crate) struct SmtpClient {
    stream: Option<BufReader<SmtpStream>>,
    host: String,
    capabilities: Option<EhloCapabilities>,
}

impl SmtpClient {
    /// Connect to the server and read its greeting.
    pub fn connect(host: &str, port: u16) -> Result<Self, MailerError> {
        let addrs = (host, port).to_socket_addrs().map_err(|e| {
            MailerError::Connection(format!("cannot resolve {host}:{port}: {e}"))
        })?;

        let mut tcp = None;
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, SMTP_TIMEOUT) {
                Ok(stream) => {
                    tcp = Some(stream);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let tcp = tcp.ok_or_else(|| {
            MailerError::Connection(match last_err {
                Some(e) => format!("connection to {host}:{port} failed: {e}"),
                None => format!("no addresses resolved for {host}:{port}"),
            })
        })?;

        tcp.set_read_timeout(Some(SMTP_TIMEOUT))
            .and_then(|()| tcp.set_write_timeout(Some(SMTP_TIMEOUT)))
            .map_err(|e| MailerError::Connection(format!("cannot set socket timeouts: {e}")))?;

        let mut client = Self {
            stream: Some(BufReader::new(SmtpStream::Plain(tcp))),
            host: host.to_string(),
            capabilities: None,
        };

        let greeting = client.read_reply()?;
        if greeting.is_error() {
            return Err(MailerError::Connection(format!(
                "server rejected connection: {} {}",
                greeting.code,
                greeting.text()
            )));
        }
        info!("SMTP connected to {host}:{port}");
        Ok(client)
    }

    /// Greet via EHLO, falling back to HELO for servers that refuse it.
    pub fn ehlo(&mut self) -> Result<(), MailerError> {
        let reply = self.command(&format!("EHLO {CLIENT_DOMAIN}"))?;
        if reply.is_positive() {
            let caps = EhloCapabilities::parse(&reply);
            debug!("EHLO greeting from {}", caps.server_name);
            self.capabilities = Some(caps);
            return Ok(());
        }

        debug!("EHLO refused, trying HELO");
        let reply = self.command(&format!("HELO {CLIENT_DOMAIN}"))?;
        if reply.is_positive() {
            self.capabilities = Some(EhloCapabilities {
                server_name: reply.lines.first().cloned().unwrap_or_default(),
                ..Default::default()
            });
            Ok(())
        } else {
            Err(MailerError::Protocol {
                command: "EHLO".to_string(),
                code: reply.code,
                reason: reply.text(),
            })
        }
    }

    /// Upgrade the plain-text connection to TLS.
    ///
    /// The caller re-issues EHLO afterwards, per RFC 3207.
    pub fn starttls(&mut self) -> Result<(), MailerError> {
        if !self.capabilities.as_ref().is_some_and(|caps| caps.starttls) {
            debug!("server did not advertise STARTTLS, attempting anyway");
        }
        let reply = self.command("STARTTLS")?;
        if !reply.is_positive() {
            return Err(MailerError::Protocol {
                command: "STARTTLS".to_string(),
                code: reply.code,
                reason: reply.text(),
            });
        }

        let reader = self.stream.take().ok_or_else(not_connected)?;
        let tcp = match reader.into_inner() {
            SmtpStream::Plain(tcp) => tcp,
            tls @ SmtpStream::Tls(_) => {
                self.stream = Some(BufReader::new(tls));
                return Ok(());
            }
        };

        let tls = self.upgrade_to_tls(tcp)?;
        self.stream = Some(BufReader::new(SmtpStream::Tls(Box::new(tls))));
        info!("STARTTLS negotiated with {}", self.host);
        Ok(())
    }

    /// Authenticate as `user`. PLAIN unless the server only offers LOGIN.
    pub fn authenticate(&mut self, user: &str, password: &str) -> Result<(), MailerError> {
        let login_only = self
            .capabilities
            .as_ref()
            .is_some_and(|caps| !caps.supports_auth("PLAIN") && caps.supports_auth("LOGIN"));

        if login_only {
            self.auth_login(user, password)
        } else {
            self.auth_plain(user, password)
        }
    }

    /// Run the mail transaction: MAIL FROM, RCPT TO per recipient, DATA.
    ///
    /// Any refused recipient aborts the transaction before DATA.
    pub fn send_envelope(
        &mut self,
        sender: &str,
        recipients: &[String],
        envelope: &str,
    ) -> Result<(), MailerError> {
        let reply = self.command(&format!("MAIL FROM:<{sender}>"))?;
        if reply.is_error() {
            return Err(MailerError::Protocol {
                command: "MAIL FROM".to_string(),
                code: reply.code,
                reason: reply.text(),
            });
        }

        let mut rejected = Vec::new();
        for recipient in recipients {
            let reply = self.command(&format!("RCPT TO:<{recipient}>"))?;
            if reply.is_error() {
                rejected.push(RejectedRecipient {
                    address: recipient.clone(),
                    code: reply.code,
                    reason: reply.text(),
                });
            }
        }
        if !rejected.is_empty() {
            return Err(MailerError::Delivery { rejected });
        }

        let reply = self.command("DATA")?;
        if !reply.is_intermediate() {
            return Err(MailerError::Protocol {
                command: "DATA".to_string(),
                code: reply.code,
                reason: reply.text(),
            });
        }

        self.write_raw(dot_stuff(envelope).as_bytes())?;
        self.write_raw(b".\r\n")?;
        self.flush()?;

        let reply = self.read_reply()?;
        if reply.is_error() {
            return Err(MailerError::Protocol {
                command: "DATA".to_string(),
                code: reply.code,
                reason: reply.text(),
            });
        }
        Ok(())
    }

    /// Close the session. Failures past this point are of no interest.
    pub fn quit(&mut self) {
        if self.stream.is_some() {
            let _ = self.command("QUIT");
            self.stream = None;
        }
    }

    // ── Authentication mechanisms ───────────────────────────────

    fn auth_plain(&mut self, user: &str, password: &str) -> Result<(), MailerError> {
        let payload = BASE64.encode(format!("\0{user}\0{password}"));
        let reply = self.command_discreet(&format!("AUTH PLAIN {payload}"), "AUTH PLAIN ****")?;
        if reply.is_positive() {
            Ok(())
        } else {
            Err(MailerError::Authentication(format!(
                "{} {}",
                reply.code,
                reply.text()
            )))
        }
    }

    fn auth_login(&mut self, user: &str, password: &str) -> Result<(), MailerError> {
        let reply = self.command("AUTH LOGIN")?;
        if !reply.is_intermediate() {
            return Err(MailerError::Authentication(format!(
                "{} {}",
                reply.code,
                reply.text()
            )));
        }

        let reply = self.command_discreet(&BASE64.encode(user), "****")?;
        if !reply.is_intermediate() {
            return Err(MailerError::Authentication(format!(
                "{} {}",
                reply.code,
                reply.text()
            )));
        }

        let reply = self.command_discreet(&BASE64.encode(password), "****")?;
        if reply.is_positive() {
            Ok(())
        } else {
            Err(MailerError::Authentication(format!(
                "{} {}",
                reply.code,
                reply.text()
            )))
        }
    }

    // ── Low-level I/O ───────────────────────────────────────────

    fn command(&mut self, cmd: &str) -> Result<SmtpReply, MailerError> {
        self.command_discreet(cmd, cmd)
    }

    /// Send a command, logging `shown` instead of the command text.
    /// Keeps credentials out of the protocol trace.
    fn command_discreet(&mut self, cmd: &str, shown: &str) -> Result<SmtpReply, MailerError> {
        debug!("C: {shown}");
        self.write_raw(format!("{cmd}\r\n").as_bytes())?;
        self.flush()?;
        self.read_reply()
    }

    fn read_reply(&mut self) -> Result<SmtpReply, MailerError> {
        let reader = self.stream.as_mut().ok_or_else(not_connected)?;
        let mut raw = String::new();
        loop {
            let mut line = String::new();
            let n = reader
                .read_line(&mut line)
                .map_err(|e| MailerError::Connection(format!("read failed: {e}")))?;
            if n == 0 {
                return Err(MailerError::Connection(
                    "connection closed by server".to_string(),
                ));
            }
            debug!("S: {}", line.trim_end());

            // Continuation lines carry `-` after the code.
            let done = line.len() < 4 || line.as_bytes()[3] != b'-';
            raw.push_str(&line);
            if done {
                break;
            }
        }
        SmtpReply::parse(&raw)
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), MailerError> {
        let reader = self.stream.as_mut().ok_or_else(not_connected)?;
        reader
            .get_mut()
            .write_all(data)
            .map_err(|e| MailerError::Connection(format!("write failed: {e}")))
    }

    fn flush(&mut self) -> Result<(), MailerError> {
        let reader = self.stream.as_mut().ok_or_else(not_connected)?;
        reader
            .get_mut()
            .flush()
            .map_err(|e| MailerError::Connection(format!("flush failed: {e}")))
    }

    // ── TLS ─────────────────────────────────────────────────────

    fn upgrade_to_tls(
        &self,
        tcp: TcpStream,
    ) -> Result<rustls::StreamOwned<rustls::ClientConnection, TcpStream>, MailerError> {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let server_name = rustls::pki_types::ServerName::try_from(self.host.clone())
            .map_err(|e| {
                MailerError::Connection(format!("invalid server name {:?}: {e}", self.host))
            })?;
        let connection = rustls::ClientConnection::new(Arc::new(config), server_name)
            .map_err(|e| MailerError::Connection(format!("TLS setup failed: {e}")))?;

        Ok(rustls::StreamOwned::new(connection, tcp))
    }
}

fn not_connected() -> MailerError {
    MailerError::Connection("not connected".to_string())
}

/// Dot-stuff the message body and normalize line endings to CRLF.
/// Lines starting with `.` get an extra `.` prepended (RFC 5321 §4.5.2).
fn dot_stuff(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 64);
    for line in body.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.starts_with('.') {
            out.push('.');
        }
        out.push_str(line);
        out.push_str("\r\n");
    }
    out
}
