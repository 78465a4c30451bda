//! QPX Mail Relay
//! Copyright (c) 2026 Mamy Ratsimbazafy
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! qpx-internals/mail-relay
//! A minimal SMTP submission client for handing plain-text notifications to a trusted relay
//! (typically a local MTA listening on port 25, no TLS, no authentication).

use thiserror::Error;
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

/// Port used when the server address does not carry one.
pub const DEFAULT_SMTP_PORT: u16 = 25;

/// Errors raised while talking to the relay
#[derive(Debug, Error)]
pub enum MailRelayError {
    #[error("invalid SMTP server address: {0:?}")]
    InvalidServer(String),
    #[error("message has no recipients")]
    NoRecipients,
    #[error("failed to connect to SMTP server {addr}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("SMTP I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SMTP server closed the connection")]
    ConnectionClosed,
    #[error("malformed SMTP reply: {0:?}")]
    MalformedReply(String),
    #[error("SMTP server rejected {command}: {reply}")]
    Rejected { command: String, reply: String },
    #[error("failed to format message date: {0}")]
    Date(#[from] time::error::Format),
}

/// A plain-text message ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    pub fn new(
        from: impl Into<String>,
        to: Vec<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to,
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Render the message in RFC 5322 format with CRLF line endings.
    ///
    /// The result is not yet dot-stuffed, see [`dot_stuff`].
    pub fn to_rfc5322(&self, date: &str, message_id: &str) -> String {
        let mut content = format!(
            "From: {}\r\n\
             To: {}\r\n\
             Subject: {}\r\n\
             Date: {}\r\n\
             Message-ID: {}\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n",
            self.from,
            self.to.join(", "),
            encode_header_text(&self.subject),
            date,
            message_id
        );
        content.push_str(&self.body.lines().collect::<Vec<_>>().join("\r\n"));
        content
    }
}

/// Encode a header value as an RFC 2047 Q-encoded word when it is not plain ASCII.
pub fn encode_header_text(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let mut encoded = String::from("=?utf-8?Q?");
    for byte in text.bytes() {
        match byte {
            b' ' => encoded.push('_'),
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b',' | b'-' | b'!' | b'*' | b'+' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("={:02X}", byte)),
        }
    }
    encoded.push_str("?=");
    encoded
}

/// Normalise line endings to CRLF and escape lines starting with a dot (RFC 5321 §4.5.2).
pub fn dot_stuff(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            if line.starts_with('.') {
                format!(".{line}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// One (possibly multi-line) server reply
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reply {
    code: u16,
    text: String,
}

/// SMTP relay endpoint
///
/// # Examples
///
/// ```ignore
/// let relay = MailRelay::from_server("localhost")?;
/// let msg = MailMessage::new("qpx@localhost", vec!["me@example.com".into()], "Hi", "Body");
/// relay.send(&msg).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailRelay {
    host: String,
    port: u16,
}

impl MailRelay {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host`, `host:port` or `[v6addr]:port`.
    pub fn from_server(server: &str) -> Result<Self, MailRelayError> {
        let server = server.trim();
        let invalid = || MailRelayError::InvalidServer(server.to_string());

        if let Some(rest) = server.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            let port = match tail.strip_prefix(':') {
                Some(p) => p.parse().map_err(|_| invalid())?,
                None if tail.is_empty() => DEFAULT_SMTP_PORT,
                None => return Err(invalid()),
            };
            if host.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::new(host, port));
        }

        let (host, port) = match server.split_once(':') {
            Some((host, port)) => (host, port.parse().map_err(|_| invalid())?),
            None => (server, DEFAULT_SMTP_PORT),
        };
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self::new(host, port))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Submit a message. Returns the generated `Message-ID`.
    pub async fn send(&self, message: &MailMessage) -> Result<String, MailRelayError> {
        if message.to.is_empty() {
            return Err(MailRelayError::NoRecipients);
        }

        let addr = self.address();
        debug!(server = %addr, recipients = message.to.len(), "Connecting to SMTP relay");
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|source| MailRelayError::Connect {
                addr: addr.clone(),
                source,
            })?;

        let message_id = generate_message_id(&message.from);
        let date = OffsetDateTime::now_utc().format(&Rfc2822)?;
        let content = message.to_rfc5322(&date, &message_id);

        submit(stream, message, &content).await?;
        debug!(message_id = %message_id, "Message accepted by relay");
        Ok(message_id)
    }
}

fn generate_message_id(from: &str) -> String {
    let domain = from
        .rsplit_once('@')
        .map(|(_, d)| d.trim_end_matches('>'))
        .filter(|d| !d.is_empty())
        .unwrap_or("localhost");
    format!(
        "<{}.{:016x}@{}>",
        OffsetDateTime::now_utc().unix_timestamp(),
        rand::random::<u64>(),
        domain
    )
}

fn local_hostname() -> String {
    hostname::get().map_or_else(
        |_| "localhost".to_string(),
        |h| h.to_string_lossy().to_string(),
    )
}

/// Run a full submission dialogue over an established stream.
async fn submit<S>(stream: S, message: &MailMessage, content: &str) -> Result<(), MailRelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    let greeting = read_reply(&mut reader).await?;
    expect(&greeting, "greeting", &[220])?;

    let helo_name = local_hostname();
    send_command(&mut writer, &format!("EHLO {helo_name}")).await?;
    let ehlo = read_reply(&mut reader).await?;
    if ehlo.code != 250 {
        debug!(code = ehlo.code, "EHLO refused, falling back to HELO");
        send_command(&mut writer, &format!("HELO {helo_name}")).await?;
        let helo = read_reply(&mut reader).await?;
        expect(&helo, "HELO", &[250])?;
    }

    send_command(&mut writer, &format!("MAIL FROM:<{}>", message.from)).await?;
    expect(&read_reply(&mut reader).await?, "MAIL FROM", &[250])?;

    for rcpt in &message.to {
        send_command(&mut writer, &format!("RCPT TO:<{rcpt}>")).await?;
        expect(&read_reply(&mut reader).await?, "RCPT TO", &[250, 251])?;
    }

    send_command(&mut writer, "DATA").await?;
    expect(&read_reply(&mut reader).await?, "DATA", &[354])?;

    writer.write_all(dot_stuff(content).as_bytes()).await?;
    writer.write_all(b"\r\n.\r\n").await?;
    writer.flush().await?;
    expect(&read_reply(&mut reader).await?, "message body", &[250])?;

    send_command(&mut writer, "QUIT").await?;
    // Some relays drop the connection right after QUIT
    if let Err(e) = read_reply(&mut reader).await {
        warn!(error = %e, "No reply to QUIT");
    }
    Ok(())
}

async fn send_command<W>(writer: &mut W, command: &str) -> Result<(), MailRelayError>
where
    W: AsyncWrite + Unpin,
{
    trace!(command = %command.split(' ').next().unwrap_or(command), "Sending SMTP command");
    writer.write_all(format!("{command}\r\n").as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_reply<R>(reader: &mut BufReader<R>) -> Result<Reply, MailRelayError>
where
    R: AsyncRead + Unpin,
{
    let mut text = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(MailRelayError::ConnectionClosed);
        }
        let line = line.trim_end_matches(['\r', '\n']);
        trace!(line = %line, "SMTP reply");

        let code: u16 = line
            .get(..3)
            .and_then(|c| c.parse().ok())
            .ok_or_else(|| MailRelayError::MalformedReply(line.to_string()))?;
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(line.get(4..).unwrap_or(""));

        // "250-..." continues, "250 ..." or bare "250" ends the reply
        if line.as_bytes().get(3) != Some(&b'-') {
            return Ok(Reply { code, text });
        }
    }
}

fn expect(reply: &Reply, command: &str, accepted: &[u16]) -> Result<(), MailRelayError> {
    if accepted.contains(&reply.code) {
        Ok(())
    } else {
        Err(MailRelayError::Rejected {
            command: command.to_string(),
            reply: format!("{} {}", reply.code, reply.text),
        })
    }
}
