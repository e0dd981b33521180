//! SMTP reply parsing

use crate::error::MailerError;

/// A parsed server reply, possibly multi-line.
#[derive(Debug, Clone)]
pub struct SmtpReply {
    /// The 3-digit reply code (e.g. 250, 354, 550).
    pub code: u16,
    /// The text of each reply line, without code or separator.
    pub lines: Vec<String>,
}

impl SmtpReply {
    /// Parse raw reply text as read off the wire.
    ///
    /// Multi-line replies use `-` after the code on every line but the
    /// last (`250-STARTTLS`, `250 SIZE 10240000`).
    pub fn parse(raw: &str) -> Result<Self, MailerError> {
        let mut code = None;
        let mut lines = Vec::new();

        for line in raw.lines() {
            let Some(prefix) = line.get(..3) else {
                continue;
            };
            let parsed: u16 = prefix.parse().map_err(|_| {
                MailerError::Connection(format!("malformed SMTP reply: {line:?}"))
            })?;
            if code.is_none() {
                code = Some(parsed);
            }
            lines.push(line.get(4..).unwrap_or("").to_string());
        }

        match code {
            Some(code) => Ok(Self { code, lines }),
            None => Err(MailerError::Connection("empty SMTP reply".to_string())),
        }
    }

    /// Positive completion (2xx).
    pub fn is_positive(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Positive intermediate (3xx), e.g. 354 after DATA.
    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    /// Transient or permanent failure (4xx / 5xx).
    pub fn is_error(&self) -> bool {
        self.code >= 400
    }

    /// The full reply text, lines joined with a space.
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

/// The subset of EHLO capabilities this client acts on.
#[derive(Debug, Clone, Default)]
pub struct EhloCapabilities {
    /// The server greeting name (first EHLO reply line).
    pub server_name: String,
    /// Advertised AUTH mechanisms, uppercased.
    pub auth_mechanisms: Vec<String>,
    /// Whether STARTTLS was advertised.
    pub starttls: bool,
}

impl EhloCapabilities {
    /// Parse an EHLO reply into capabilities.
    pub fn parse(reply: &SmtpReply) -> Self {
        let mut caps = Self::default();
        for (i, line) in reply.lines.iter().enumerate() {
            if i == 0 {
                caps.server_name = line.clone();
                continue;
            }
            let upper = line.to_uppercase();
            let mut parts = upper.splitn(2, ' ');
            let keyword = parts.next().unwrap_or("");
            let param = parts.next().unwrap_or("");

            match keyword {
                "AUTH" => {
                    caps.auth_mechanisms =
                        param.split_whitespace().map(str::to_string).collect();
                }
                "STARTTLS" => caps.starttls = true,
                _ => {}
            }
        }
        caps
    }

    /// Whether a specific AUTH mechanism was advertised.
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        let upper = mechanism.to_uppercase();
        self.auth_mechanisms.iter().any(|m| m == &upper)
    }
}
