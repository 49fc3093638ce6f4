//! Line-and-literal framing over the raw stream.
//!
//! IMAP responses are CRLF lines that may announce `{n}` literals; a
//! complete response is the line plus every announced literal plus the
//! continuation line after each one.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::trace;

use crate::command::{EncodedCommand, Segment};
use crate::parser::{Response, ResponseParser};
use crate::{Error, Result};

const READ_BUFFER_SIZE: usize = 8192;

/// Upper bound on one response line.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Upper bound on one literal payload.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024;

/// Buffered framed connection.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
        }
    }

    /// Reads one complete response, inlining announced literals.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();

        loop {
            let line = self.read_line().await?;
            response.extend_from_slice(&line);

            if let Some(len) = trailing_literal_len(&line) {
                if len > MAX_LITERAL_SIZE {
                    return Err(Error::Protocol(format!(
                        "literal too large: {len} bytes (max {MAX_LITERAL_SIZE})"
                    )));
                }
                let mut literal = vec![0u8; len];
                self.reader.read_exact(&mut literal).await?;
                response.extend_from_slice(&literal);
                // More of the same response follows the literal
            } else {
                break;
            }
        }

        trace!(len = response.len(), "S: response");
        Ok(response)
    }

    /// Reads one complete response, bounded by `timeout`.
    pub async fn read_response_within(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        tokio::time::timeout(timeout, self.read_response())
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }

    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::ConnectionClosed);
            }

            if let Some(pos) = find_crlf(buf) {
                line.extend_from_slice(&buf[..pos + 2]);
                self.reader.consume(pos + 2);
                break;
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("response line too long".to_string()));
            }
        }

        Ok(line)
    }

    /// Writes raw bytes and flushes.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(data);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buffer).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Transmits an encoded command, honouring literal continuations.
    ///
    /// Each literal segment is sent only after the server answers the
    /// preceding line with `+`; a tagged NO/BAD instead aborts the send.
    pub async fn send_command(&mut self, command: &EncodedCommand) -> Result<()> {
        // Only lengths are traced; command lines can carry credentials
        for segment in command.segments() {
            match segment {
                Segment::Line(bytes) => {
                    trace!(len = bytes.len(), "C: line");
                    self.write_all(bytes).await?;
                }
                Segment::Literal(data) => {
                    let reply = self.read_response().await?;
                    if !reply.starts_with(b"+") {
                        return match ResponseParser::parse(&reply)? {
                            Response::Tagged {
                                status: crate::types::Status::No,
                                text,
                                ..
                            } => Err(Error::No(text)),
                            Response::Tagged {
                                status: crate::types::Status::Bad,
                                text,
                                ..
                            } => Err(Error::Bad(text)),
                            _ => Err(Error::Protocol(
                                "expected continuation before literal".to_string(),
                            )),
                        };
                    }
                    self.write_all(data).await?;
                }
            }
        }
        Ok(())
    }

    /// Consumes the framing and returns the inner stream.
    ///
    /// Buffered but unread bytes are dropped.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Extracts the literal length if the line ends with `{n}` or `{n+}`.
fn trailing_literal_len(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?;

    let open = line.iter().rposition(|&b| b == b'{')?;
    let inner = line.get(open + 1..line.len().checked_sub(1)?)?;
    if !line.ends_with(b"}") {
        return None;
    }
    let digits = inner.strip_suffix(b"+").unwrap_or(inner);
    if digits.is_empty() {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Collects every response up to the matching tagged completion.
pub struct ResponseAccumulator {
    tag: String,
}

impl ResponseAccumulator {
    /// Creates an accumulator for the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Reads responses until the tagged line arrives; untagged lines that
    /// precede it belong to the same command.
    pub async fn collect<S>(
        &self,
        framed: &mut FramedStream<S>,
        timeout: Duration,
    ) -> Result<Vec<Vec<u8>>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut responses = Vec::new();

        loop {
            let response = framed.read_response_within(timeout).await?;

            let is_ours = response
                .get(..self.tag.len())
                .is_some_and(|prefix| prefix == self.tag.as_bytes())
                && response.get(self.tag.len()) == Some(&b' ');

            responses.push(response);
            if is_ours {
                return Ok(responses);
            }
        }
    }
}
