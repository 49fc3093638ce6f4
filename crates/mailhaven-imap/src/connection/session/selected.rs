//! Commands available while a mailbox is open.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Session;
use super::authenticated::collect_selected_state;
use super::states::{Authenticated, Selected};
use crate::command::{Command, FetchSpec, SearchCriteria, StoreAction, uid_set_as_sequence};
use crate::parser::{FetchItem, UntaggedResponse};
use crate::types::{Mailbox, MsgSeq, SelectedState, SequenceSet, UidSet};
use crate::Result;

/// FETCH rows keyed by message sequence number.
pub type FetchRows = Vec<(MsgSeq, Vec<FetchItem>)>;

impl<S> Session<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// The mailbox this session has open.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        self.state.mailbox()
    }

    /// Switches to a different mailbox without closing first.
    pub async fn select(mut self, mailbox: &Mailbox) -> Result<(Self, SelectedState)> {
        let responses = self
            .run(&Command::Select {
                mailbox: mailbox.clone(),
            })
            .await?;
        let state = collect_selected_state(&Self::untagged(&responses));
        self.state = Selected {
            mailbox: mailbox.clone(),
        };
        Ok((self, state))
    }

    /// Runs SEARCH (or UID SEARCH) and returns matched identifiers.
    pub async fn search(
        &mut self,
        criteria: &SearchCriteria,
        charset: Option<&str>,
        uid: bool,
    ) -> Result<Vec<u32>> {
        let responses = self
            .run(&Command::Search {
                charset: charset.map(ToString::to_string),
                criteria: criteria.clone(),
                uid,
            })
            .await?;

        let mut ids = Vec::new();
        for untagged in Self::untagged(&responses) {
            if let UntaggedResponse::Search(found) = untagged {
                ids.extend(found);
            }
        }
        Ok(ids)
    }

    /// Fetches data for a sequence-number set.
    pub async fn fetch(&mut self, set: &SequenceSet, spec: FetchSpec) -> Result<FetchRows> {
        let responses = self
            .run(&Command::Fetch {
                set: set.clone(),
                spec,
                uid: false,
            })
            .await?;
        Ok(Self::fetch_rows(&responses))
    }

    /// Fetches data for a UID set.
    pub async fn uid_fetch(&mut self, set: &UidSet, spec: FetchSpec) -> Result<FetchRows> {
        let responses = self
            .run(&Command::Fetch {
                set: uid_set_as_sequence(set),
                spec,
                uid: true,
            })
            .await?;
        Ok(Self::fetch_rows(&responses))
    }

    /// Mutates flags; returns the untagged FETCH echoes.
    pub async fn store(
        &mut self,
        set: &SequenceSet,
        action: StoreAction,
        silent: bool,
    ) -> Result<FetchRows> {
        let responses = self
            .run(&Command::Store {
                set: set.clone(),
                action,
                silent,
                uid: false,
            })
            .await?;
        Ok(Self::fetch_rows(&responses))
    }

    /// Mutates flags addressed by UID.
    pub async fn uid_store(
        &mut self,
        set: &UidSet,
        action: StoreAction,
        silent: bool,
    ) -> Result<FetchRows> {
        let responses = self
            .run(&Command::Store {
                set: uid_set_as_sequence(set),
                action,
                silent,
                uid: true,
            })
            .await?;
        Ok(Self::fetch_rows(&responses))
    }

    /// Copies messages to another mailbox.
    pub async fn copy(&mut self, set: &SequenceSet, mailbox: &Mailbox) -> Result<()> {
        self.run(&Command::Copy {
            set: set.clone(),
            mailbox: mailbox.clone(),
            uid: false,
        })
        .await?;
        Ok(())
    }

    /// Copies messages addressed by UID.
    pub async fn uid_copy(&mut self, set: &UidSet, mailbox: &Mailbox) -> Result<()> {
        self.run(&Command::Copy {
            set: uid_set_as_sequence(set),
            mailbox: mailbox.clone(),
            uid: true,
        })
        .await?;
        Ok(())
    }

    /// Moves messages to another mailbox (RFC 6851).
    pub async fn r#move(&mut self, set: &SequenceSet, mailbox: &Mailbox) -> Result<()> {
        self.run(&Command::Move {
            set: set.clone(),
            mailbox: mailbox.clone(),
            uid: false,
        })
        .await?;
        Ok(())
    }

    /// Moves messages addressed by UID.
    pub async fn uid_move(&mut self, set: &UidSet, mailbox: &Mailbox) -> Result<()> {
        self.run(&Command::Move {
            set: uid_set_as_sequence(set),
            mailbox: mailbox.clone(),
            uid: true,
        })
        .await?;
        Ok(())
    }

    /// Permanently removes `\Deleted` messages; returns expunged numbers.
    pub async fn expunge(&mut self) -> Result<Vec<MsgSeq>> {
        let responses = self.run(&Command::Expunge).await?;

        Ok(Self::untagged(&responses)
            .into_iter()
            .filter_map(|u| match u {
                UntaggedResponse::Expunge(seq) => Some(seq),
                _ => None,
            })
            .collect())
    }

    /// Requests a server checkpoint.
    pub async fn check(&mut self) -> Result<()> {
        self.run(&Command::Check).await?;
        Ok(())
    }

    /// Closes the mailbox, expunging silently, and returns to the
    /// authenticated state.
    pub async fn close(mut self) -> Result<Session<S, Authenticated>> {
        self.run(&Command::Close).await?;
        Ok(self.into_state(Authenticated))
    }

    /// Logs out and drops the connection.
    pub async fn logout(mut self) -> Result<()> {
        let _ = self.run(&Command::Logout).await;
        Ok(())
    }

    fn fetch_rows(responses: &[Vec<u8>]) -> FetchRows {
        Self::untagged(responses)
            .into_iter()
            .filter_map(|u| match u {
                UntaggedResponse::Fetch { seq, items } => Some((seq, items)),
                _ => None,
            })
            .collect()
    }
}
