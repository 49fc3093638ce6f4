//! Commands available after authentication.
//!
//! Everything here except SELECT/EXAMINE is implemented for every
//! [`AuthState`], since RFC 3501 keeps the authenticated command set
//! available while a mailbox is selected.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Session;
use super::states::{AuthState, Authenticated, Selected};
use crate::command::Command;
use crate::parser::UntaggedResponse;
use crate::types::{
    Flag, ListEntry, Mailbox, Quota, ResponseCode, SelectedState, StatusItem, StatusQuery, Uid,
    UidValidity,
};
use crate::{Error, Result};

impl<S> Session<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Opens a mailbox read-write.
    pub async fn select(self, mailbox: &Mailbox) -> Result<(Session<S, Selected>, SelectedState)> {
        self.open(mailbox, false).await
    }

    /// Opens a mailbox read-only.
    pub async fn examine(self, mailbox: &Mailbox) -> Result<(Session<S, Selected>, SelectedState)> {
        self.open(mailbox, true).await
    }

    async fn open(
        mut self,
        mailbox: &Mailbox,
        read_only: bool,
    ) -> Result<(Session<S, Selected>, SelectedState)> {
        let command = if read_only {
            Command::Examine {
                mailbox: mailbox.clone(),
            }
        } else {
            Command::Select {
                mailbox: mailbox.clone(),
            }
        };
        let responses = self.run(&command).await?;
        let mut state = collect_selected_state(&Self::untagged(&responses));
        state.read_only |= read_only;

        let session = self.into_state(Selected {
            mailbox: mailbox.clone(),
        });
        Ok((session, state))
    }

    /// Logs out and drops the connection.
    pub async fn logout(mut self) -> Result<()> {
        let _ = self.run(&Command::Logout).await;
        Ok(())
    }
}

impl<S, St> Session<S, St>
where
    S: AsyncRead + AsyncWrite + Unpin,
    St: AuthState,
{
    /// Lists mailboxes matching the pattern.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        let responses = self
            .run(&Command::List {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;

        Ok(Self::untagged(&responses)
            .into_iter()
            .filter_map(|u| match u {
                UntaggedResponse::List(entry) => Some(entry),
                _ => None,
            })
            .collect())
    }

    /// Lists subscribed mailboxes matching the pattern.
    pub async fn lsub(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        let responses = self
            .run(&Command::Lsub {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;

        Ok(Self::untagged(&responses)
            .into_iter()
            .filter_map(|u| match u {
                UntaggedResponse::Lsub(entry) => Some(entry),
                _ => None,
            })
            .collect())
    }

    /// Creates a mailbox.
    pub async fn create(&mut self, mailbox: &Mailbox) -> Result<()> {
        self.run(&Command::Create {
            mailbox: mailbox.clone(),
        })
        .await?;
        Ok(())
    }

    /// Deletes a mailbox.
    pub async fn delete(&mut self, mailbox: &Mailbox) -> Result<()> {
        self.run(&Command::Delete {
            mailbox: mailbox.clone(),
        })
        .await?;
        Ok(())
    }

    /// Renames a mailbox.
    pub async fn rename(&mut self, from: &Mailbox, to: &Mailbox) -> Result<()> {
        self.run(&Command::Rename {
            from: from.clone(),
            to: to.clone(),
        })
        .await?;
        Ok(())
    }

    /// Subscribes to a mailbox.
    pub async fn subscribe(&mut self, mailbox: &Mailbox) -> Result<()> {
        self.run(&Command::Subscribe {
            mailbox: mailbox.clone(),
        })
        .await?;
        Ok(())
    }

    /// Unsubscribes from a mailbox.
    pub async fn unsubscribe(&mut self, mailbox: &Mailbox) -> Result<()> {
        self.run(&Command::Unsubscribe {
            mailbox: mailbox.clone(),
        })
        .await?;
        Ok(())
    }

    /// Queries mailbox counters without selecting it.
    pub async fn status(
        &mut self,
        mailbox: &Mailbox,
        items: Vec<StatusQuery>,
    ) -> Result<Vec<StatusItem>> {
        let responses = self
            .run(&Command::Status {
                mailbox: mailbox.clone(),
                items,
            })
            .await?;

        Ok(Self::untagged(&responses)
            .into_iter()
            .filter_map(|u| match u {
                UntaggedResponse::Status { items, .. } => Some(items),
                _ => None,
            })
            .flatten()
            .collect())
    }

    /// Appends a complete message; returns the assigned UID when the
    /// server reports one (UIDPLUS).
    pub async fn append(
        &mut self,
        mailbox: &Mailbox,
        flags: Option<Vec<Flag>>,
        message: &[u8],
    ) -> Result<Option<(UidValidity, Uid)>> {
        let responses = self
            .run(&Command::Append {
                mailbox: mailbox.clone(),
                flags,
                message: message.to_vec(),
            })
            .await?;

        for raw in &responses {
            if let Ok(crate::parser::Response::Tagged {
                code: Some(ResponseCode::AppendUid { validity, uid }),
                ..
            }) = crate::parser::ResponseParser::parse(raw)
            {
                return Ok(Some((validity, uid)));
            }
        }
        Ok(None)
    }

    /// Fetches quota resources for the named root.
    pub async fn get_quota(&mut self, root: &str) -> Result<Vec<Quota>> {
        let responses = self
            .run(&Command::GetQuota {
                root: root.to_string(),
            })
            .await?;

        Ok(Self::untagged(&responses)
            .into_iter()
            .filter_map(|u| match u {
                UntaggedResponse::Quota(quota) => Some(quota),
                _ => None,
            })
            .collect())
    }

    /// Resolves the quota roots of a mailbox and their resources.
    pub async fn get_quota_root(&mut self, mailbox: &Mailbox) -> Result<(Vec<String>, Vec<Quota>)> {
        let responses = self
            .run(&Command::GetQuotaRoot {
                mailbox: mailbox.clone(),
            })
            .await?;

        let mut roots = Vec::new();
        let mut quotas = Vec::new();
        for untagged in Self::untagged(&responses) {
            match untagged {
                UntaggedResponse::QuotaRoot { roots: r, .. } => roots.extend(r),
                UntaggedResponse::Quota(q) => quotas.push(q),
                _ => {}
            }
        }
        Ok((roots, quotas))
    }

    /// Exchanges client/server identification (RFC 2971).
    pub async fn id(
        &mut self,
        parameters: Option<Vec<(String, String)>>,
    ) -> Result<Vec<(String, String)>> {
        if !self.supports_id() {
            return Err(Error::Protocol(
                "server does not advertise ID".to_string(),
            ));
        }
        let responses = self.run(&Command::Id { parameters }).await?;

        Ok(Self::untagged(&responses)
            .into_iter()
            .find_map(|u| match u {
                UntaggedResponse::Id(pairs) => Some(pairs),
                _ => None,
            })
            .unwrap_or_default())
    }
}

/// Folds SELECT/EXAMINE untagged data into a [`SelectedState`].
pub(crate) fn collect_selected_state(untagged: &[UntaggedResponse]) -> SelectedState {
    let mut state = SelectedState::default();

    for item in untagged {
        match item {
            UntaggedResponse::Exists(n) => state.exists = *n,
            UntaggedResponse::Recent(n) => state.recent = *n,
            UntaggedResponse::Flags(flags) => state.flags = flags.clone(),
            UntaggedResponse::Ok {
                code: Some(code), ..
            } => match code {
                ResponseCode::UidValidity(v) => state.uid_validity = Some(*v),
                ResponseCode::UidNext(uid) => state.uid_next = Some(*uid),
                ResponseCode::Unseen(seq) => state.unseen = Some(*seq),
                ResponseCode::PermanentFlags(flags) => {
                    state.permanent_flags = flags.iter().cloned().collect();
                }
                ResponseCode::ReadOnly => state.read_only = true,
                _ => {}
            },
            _ => {}
        }
    }

    state
}
