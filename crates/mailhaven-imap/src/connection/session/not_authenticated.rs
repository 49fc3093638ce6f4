//! Commands available before authentication.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use super::Session;
use super::states::{Authenticated, NotAuthenticated};
use crate::auth::{login_step, plain_response, xoauth2_response};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::{FramedStream, ResponseAccumulator};
use crate::connection::stream::ImapStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::ResponseCode;
use crate::{Error, Result};

impl<S> Session<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream, reading the server greeting.
    ///
    /// Capabilities embedded in the greeting are recorded; a BYE greeting
    /// is an immediate error.
    pub async fn greet(stream: S, stream_timeout: Duration) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = framed.read_response_within(stream_timeout).await?;
        let mut capabilities = Vec::new();

        match ResponseParser::parse(&greeting)? {
            Response::Untagged(
                UntaggedResponse::Ok {
                    code: Some(ResponseCode::Capability(caps)),
                    ..
                }
                | UntaggedResponse::PreAuth {
                    code: Some(ResponseCode::Capability(caps)),
                    ..
                },
            ) => capabilities = caps,
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text));
            }
            Response::Untagged(UntaggedResponse::Ok { .. } | UntaggedResponse::PreAuth { .. }) => {}
            other => {
                return Err(Error::Protocol(format!(
                    "unexpected greeting: {other:?}"
                )));
            }
        }

        Ok(Self {
            stream: framed,
            tags: TagGenerator::default(),
            capabilities,
            stream_timeout,
            state: NotAuthenticated,
        })
    }

    /// Authenticates with LOGIN.
    ///
    /// On rejection the error carries only the server text.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Session<S, Authenticated>> {
        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let responses = self.run(&command).await.map_err(auth_error)?;
        self.absorb_capabilities(&responses);

        Ok(self.into_state(Authenticated))
    }

    /// Authenticates with SASL PLAIN via AUTHENTICATE.
    pub async fn authenticate_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Session<S, Authenticated>> {
        let command = Command::Authenticate {
            mechanism: "PLAIN".to_string(),
            initial_response: Some(plain_response(username, password)),
        };
        let responses = self.run(&command).await.map_err(auth_error)?;
        self.absorb_capabilities(&responses);

        Ok(self.into_state(Authenticated))
    }

    /// Authenticates with the XOAUTH2 mechanism.
    pub async fn authenticate_xoauth2(
        mut self,
        username: &str,
        access_token: &str,
    ) -> Result<Session<S, Authenticated>> {
        let command = Command::Authenticate {
            mechanism: "XOAUTH2".to_string(),
            initial_response: Some(xoauth2_response(username, access_token)),
        };
        let responses = self.run(&command).await.map_err(auth_error)?;
        self.absorb_capabilities(&responses);

        Ok(self.into_state(Authenticated))
    }

    /// Authenticates with the LOGIN mechanism: the server prompts for the
    /// username and password in two continuation steps.
    pub async fn authenticate_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Session<S, Authenticated>> {
        let tag = self.tags.next();
        let command = Command::Authenticate {
            mechanism: "LOGIN".to_string(),
            initial_response: None,
        };
        self.stream.send_command(&command.encode(&tag)).await?;

        for secret in [username, password] {
            let reply = self
                .stream
                .read_response_within(self.stream_timeout)
                .await?;
            if !reply.starts_with(b"+") {
                return Err(auth_error(completion_error(&reply, &tag)));
            }
            let step = format!("{}\r\n", login_step(secret));
            self.stream.write_all(step.as_bytes()).await?;
        }

        let responses = ResponseAccumulator::new(&tag)
            .collect(&mut self.stream, self.stream_timeout)
            .await?;
        Self::check_completion(&responses, &tag).map_err(auth_error)?;
        self.absorb_capabilities(&responses);

        Ok(self.into_state(Authenticated))
    }

    /// Logs out and drops the connection.
    pub async fn logout(mut self) -> Result<()> {
        let _ = self.run(&Command::Logout).await;
        Ok(())
    }
}

impl Session<ImapStream, NotAuthenticated> {
    /// Issues STARTTLS and upgrades the stream in place.
    ///
    /// Capabilities are refreshed afterwards since the pre-TLS list is no
    /// longer authoritative.
    pub async fn starttls(mut self, host: &str, validate_cert: bool) -> Result<Self> {
        self.run(&Command::StartTls).await?;

        let plain = self.stream.into_inner();
        let tls = plain.upgrade_to_tls(host, validate_cert).await?;

        let mut session = Self {
            stream: FramedStream::new(tls),
            tags: self.tags,
            capabilities: Vec::new(),
            stream_timeout: self.stream_timeout,
            state: NotAuthenticated,
        };
        session.capability().await?;
        Ok(session)
    }
}

/// Maps a command rejection to an authentication error.
fn auth_error(err: Error) -> Error {
    match err {
        Error::No(text) | Error::Bad(text) => Error::Auth(text),
        other => other,
    }
}

/// Extracts the error from a non-continuation reply during SASL steps.
fn completion_error(reply: &[u8], tag: &str) -> Error {
    if let Ok(Response::Tagged {
        tag: resp_tag,
        status,
        text,
        ..
    }) = ResponseParser::parse(reply)
        && resp_tag.as_str() == tag
    {
        return match status {
            crate::types::Status::No => Error::No(text),
            crate::types::Status::Bad => Error::Bad(text),
            _ => Error::Protocol("unexpected completion during AUTHENTICATE".to_string()),
        };
    }
    Error::Protocol("expected continuation during AUTHENTICATE".to_string())
}
