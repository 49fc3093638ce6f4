//! Typestate IMAP session.
//!
//! State transitions are enforced at compile time: commands that require
//! authentication or a selected mailbox only exist on the matching state.
//! At most one tagged command is ever in flight because every command
//! method takes `&mut self` and drains the response before returning.

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

pub use selected::FetchRows;
pub use states::{AuthState, Authenticated, NotAuthenticated, Selected};

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use super::framed::{FramedStream, ResponseAccumulator};
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, Status};
use crate::{Error, Result};

/// An IMAP session in state `State` over stream `S`.
pub struct Session<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tags: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) stream_timeout: Duration,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Session<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("capabilities", &self.capabilities)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S, State> Session<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Advertised server capabilities, as last reported.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns true if the server advertised the capability.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// IDLE support (RFC 2177).
    #[must_use]
    pub fn supports_idle(&self) -> bool {
        self.has_capability(&Capability::Idle)
    }

    /// MOVE support (RFC 6851).
    #[must_use]
    pub fn supports_move(&self) -> bool {
        self.has_capability(&Capability::Move)
    }

    /// QUOTA support (RFC 2087).
    #[must_use]
    pub fn supports_quota(&self) -> bool {
        self.has_capability(&Capability::Quota)
    }

    /// ID support (RFC 2971).
    #[must_use]
    pub fn supports_id(&self) -> bool {
        self.has_capability(&Capability::Id)
    }

    /// True when the server refuses LOGIN on this connection.
    #[must_use]
    pub fn login_disabled(&self) -> bool {
        self.has_capability(&Capability::LoginDisabled)
    }

    /// True when the server offers the given SASL mechanism.
    #[must_use]
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| matches!(c, Capability::Auth(m) if m.eq_ignore_ascii_case(mechanism)))
    }

    /// Sends NOOP, polling the server for unilateral updates.
    pub async fn noop(&mut self) -> Result<Vec<UntaggedResponse>> {
        let responses = self.run(&Command::Noop).await?;
        Ok(Self::untagged(&responses))
    }

    /// Sends CAPABILITY and refreshes the stored capability list.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        let responses = self.run(&Command::Capability).await?;
        for untagged in Self::untagged(&responses) {
            if let UntaggedResponse::Capability(caps) = untagged {
                self.capabilities = caps;
            }
        }
        Ok(self.capabilities.clone())
    }

    /// Sends a command and collects everything up to its tagged
    /// completion, which must be OK.
    pub(crate) async fn run(&mut self, command: &Command) -> Result<Vec<Vec<u8>>> {
        let tag = self.tags.next();
        self.stream.send_command(&command.encode(&tag)).await?;

        let responses = ResponseAccumulator::new(&tag)
            .collect(&mut self.stream, self.stream_timeout)
            .await?;
        Self::check_completion(&responses, &tag)?;
        Ok(responses)
    }

    /// Verifies that the tagged completion for `tag` is OK.
    pub(crate) fn check_completion(responses: &[Vec<u8>], tag: &str) -> Result<()> {
        for raw in responses.iter().rev() {
            if let Ok(Response::Tagged {
                tag: resp_tag,
                status,
                text,
                ..
            }) = ResponseParser::parse(raw)
                && resp_tag.as_str() == tag
            {
                return match status {
                    Status::Ok | Status::PreAuth => Ok(()),
                    Status::No => Err(Error::No(text)),
                    Status::Bad => Err(Error::Bad(text)),
                    Status::Bye => Err(Error::Bye(text)),
                };
            }
        }
        Err(Error::Protocol("missing tagged completion".to_string()))
    }

    /// Parses the untagged lines out of a response batch.
    pub(crate) fn untagged(responses: &[Vec<u8>]) -> Vec<UntaggedResponse> {
        responses
            .iter()
            .filter_map(|raw| match ResponseParser::parse(raw) {
                Ok(Response::Untagged(untagged)) => Some(untagged),
                _ => None,
            })
            .collect()
    }

    /// Consumes the session and returns the underlying framed stream.
    pub fn into_stream(self) -> FramedStream<S> {
        self.stream
    }

    /// Moves the session into another state.
    pub(crate) fn into_state<T>(self, state: T) -> Session<S, T> {
        Session {
            stream: self.stream,
            tags: self.tags,
            capabilities: self.capabilities,
            stream_timeout: self.stream_timeout,
            state,
        }
    }

    /// Updates stored capabilities from any CAPABILITY data in a batch.
    pub(crate) fn absorb_capabilities(&mut self, responses: &[Vec<u8>]) {
        for untagged in Self::untagged(responses) {
            if let UntaggedResponse::Capability(caps) = untagged {
                self.capabilities = caps;
            }
        }
    }
}
