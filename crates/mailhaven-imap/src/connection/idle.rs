//! IDLE support (RFC 2177).
//!
//! After the continuation handshake the server pushes untagged updates
//! until the client sends DONE. The stream timeout is surfaced as
//! [`IdleEvent::Timeout`] so callers can run keepalive cycles instead of
//! treating it as a failure.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use super::framed::FramedStream;
use super::session::{Selected, Session};
use crate::command::Command;
use crate::parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
use crate::types::{FlagSet, MsgSeq, Status};
use crate::{Error, Result};

/// An update received while idling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleEvent {
    /// New message count.
    Exists(u32),
    /// Recent count changed.
    Recent(u32),
    /// A message was expunged.
    Expunge(MsgSeq),
    /// Flags changed on a message.
    Fetch {
        /// Message sequence number.
        seq: MsgSeq,
        /// Flags as pushed by the server.
        flags: FlagSet,
    },
    /// The wait elapsed without server traffic.
    Timeout,
}

/// Handle over an outstanding IDLE command.
///
/// Dropping the handle without calling [`IdleHandle::done`] leaves the
/// connection idling; callers should always complete the DONE handshake.
pub struct IdleHandle<'a, S> {
    stream: &'a mut FramedStream<S>,
    tag: String,
}

impl<'a, S> IdleHandle<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) const fn new(stream: &'a mut FramedStream<S>, tag: String) -> Self {
        Self { stream, tag }
    }

    /// Waits for the next pushed update or the timeout.
    pub async fn wait(&mut self, duration: Duration) -> Result<IdleEvent> {
        match self.stream.read_response_within(duration).await {
            Ok(response) => self.interpret(&response),
            Err(Error::Timeout(_)) => Ok(IdleEvent::Timeout),
            Err(other) => Err(other),
        }
    }

    fn interpret(&self, response: &[u8]) -> Result<IdleEvent> {
        match ResponseParser::parse(response)? {
            Response::Untagged(untagged) => match untagged {
                UntaggedResponse::Exists(n) => Ok(IdleEvent::Exists(n)),
                UntaggedResponse::Recent(n) => Ok(IdleEvent::Recent(n)),
                UntaggedResponse::Expunge(seq) => Ok(IdleEvent::Expunge(seq)),
                UntaggedResponse::Fetch { seq, items } => {
                    let flags = items
                        .into_iter()
                        .find_map(|item| match item {
                            FetchItem::Flags(f) => Some(f),
                            _ => None,
                        })
                        .unwrap_or_default();
                    Ok(IdleEvent::Fetch { seq, flags })
                }
                UntaggedResponse::Bye { text, .. } => Err(Error::Bye(text)),
                // Other unsolicited lines are not interesting mid-IDLE
                _ => Ok(IdleEvent::Timeout),
            },
            Response::Tagged {
                tag, status, text, ..
            } if tag.as_str() == self.tag => match status {
                // Server ended IDLE on its own; treat like an expiry
                Status::Ok => Ok(IdleEvent::Timeout),
                Status::No => Err(Error::No(text)),
                Status::Bad => Err(Error::Bad(text)),
                Status::Bye | Status::PreAuth => {
                    Err(Error::Protocol("unexpected completion during IDLE".to_string()))
                }
            },
            other => Err(Error::Protocol(format!(
                "unexpected response during IDLE: {other:?}"
            ))),
        }
    }

    /// Ends IDLE by sending DONE and waits for the tagged completion.
    pub async fn done(self) -> Result<()> {
        self.stream
            .send_command(&Command::Done.encode(""))
            .await?;

        loop {
            let response = self.stream.read_response().await?;
            if let Ok(Response::Tagged {
                tag, status, text, ..
            }) = ResponseParser::parse(&response)
                && tag.as_str() == self.tag
            {
                return match status {
                    Status::Ok => Ok(()),
                    Status::No => Err(Error::No(text)),
                    Status::Bad => Err(Error::Bad(text)),
                    Status::Bye | Status::PreAuth => Err(Error::Protocol(
                        "unexpected completion after DONE".to_string(),
                    )),
                };
            }
            // Untagged lines may still arrive before the completion
        }
    }
}

impl<S> Session<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Enters IDLE; the returned handle borrows the session until DONE.
    pub async fn idle(&mut self) -> Result<IdleHandle<'_, S>> {
        let tag = self.tags.next();
        self.stream
            .send_command(&Command::Idle.encode(&tag))
            .await?;

        let reply = self
            .stream
            .read_response_within(self.stream_timeout)
            .await?;
        if !reply.starts_with(b"+") {
            if let Ok(Response::Tagged { status, text, .. }) = ResponseParser::parse(&reply) {
                return match status {
                    Status::No => Err(Error::No(text)),
                    Status::Bad => Err(Error::Bad(text)),
                    _ => Err(Error::Protocol("unexpected reply to IDLE".to_string())),
                };
            }
            return Err(Error::Protocol(
                "expected continuation after IDLE".to_string(),
            ));
        }

        Ok(IdleHandle::new(&mut self.stream, tag))
    }
}
