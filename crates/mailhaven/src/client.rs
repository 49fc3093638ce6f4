//! The client session state machine.
//!
//! Wraps the typestate protocol session in a runtime state machine so
//! callers keep one value across connect, authenticate, select, and
//! disconnect. Every command-issuing method re-establishes the
//! connection first when it finds the session dead.

use std::collections::HashMap;

use tracing::{debug, warn};

use mailhaven_imap::command::{SearchCriteria, StoreAction};
use mailhaven_imap::connection::{
    Authenticated, ImapStream, NotAuthenticated, Selected, Session, open,
};
use mailhaven_imap::types::{
    Flag, Mailbox, Quota, SelectedState, SequenceSet, StatusItem, StatusQuery, UidSet,
};

use crate::config::{AccountConfig, AuthMethod, Options, SequenceKind};
use crate::error::{Error, Result};
use crate::events::{EventPayload, EventRegistry};
use crate::folder::Folder;
use crate::query::Query;

/// Runtime connection state. Idling is not a variant here: the IDLE
/// watcher runs on its own cloned client.
enum ConnectionState {
    Disconnected,
    Connected(Session<ImapStream, NotAuthenticated>),
    Authenticated(Session<ImapStream, Authenticated>),
    Selected(Session<ImapStream, Selected>),
    LoggedOut,
}

impl ConnectionState {
    const fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected(_) => "connected",
            Self::Authenticated(_) => "authenticated",
            Self::Selected(_) => "selected",
            Self::LoggedOut => "logged out",
        }
    }
}

/// Dispatches a mailbox-management call to whichever session state is
/// live; these commands are valid both authenticated and selected.
macro_rules! with_session {
    ($self:ident, $session:ident => $body:expr) => {
        match &mut $self.state {
            ConnectionState::Authenticated($session) => $body,
            ConnectionState::Selected($session) => $body,
            other => {
                return Err(Error::Runtime(format!(
                    "no authenticated session (session is {})",
                    other.name()
                )));
            }
        }
    };
}

/// Per-session MSN↔UID map, tagged with the mailbox epoch.
#[derive(Debug, Default)]
struct UidCache {
    validity: Option<u32>,
    msn_to_uid: HashMap<u32, u32>,
    uid_to_msn: HashMap<u32, u32>,
}

impl UidCache {
    fn note(&mut self, msn: u32, uid: u32) {
        self.msn_to_uid.insert(msn, uid);
        self.uid_to_msn.insert(uid, msn);
    }

    fn clear(&mut self) {
        self.msn_to_uid.clear();
        self.uid_to_msn.clear();
    }

    /// Re-tags the cache for a (possibly new) UIDVALIDITY; a change
    /// invalidates everything cached before it.
    fn retag(&mut self, validity: Option<u32>) {
        if self.validity != validity {
            self.clear();
            self.validity = validity;
        }
    }
}

/// One IMAP account session.
pub struct Client {
    account: AccountConfig,
    options: Options,
    state: ConnectionState,
    active_folder: Option<String>,
    uid_cache: UidCache,
    events: EventRegistry,
}

impl Client {
    /// Builds a disconnected client for the account.
    #[must_use]
    pub fn new(account: AccountConfig, options: Options) -> Self {
        Self {
            account,
            options,
            state: ConnectionState::Disconnected,
            active_folder: None,
            uid_cache: UidCache::default(),
            events: EventRegistry::new(),
        }
    }

    /// The resolved account configuration.
    #[must_use]
    pub const fn account(&self) -> &AccountConfig {
        &self.account
    }

    /// The library options this client runs with.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// The event registry for this client.
    pub fn events(&mut self) -> &mut EventRegistry {
        &mut self.events
    }

    /// A second client sharing this one's configuration but with an
    /// independent connection; used by the IDLE watcher so long polls do
    /// not block command traffic here.
    #[must_use]
    pub fn clone_session(&self) -> Self {
        Self::new(self.account.clone(), self.options.clone())
    }

    /// True while a live session exists.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Connected(_)
                | ConnectionState::Authenticated(_)
                | ConnectionState::Selected(_)
        )
    }

    /// The folder currently open, if any.
    #[must_use]
    pub fn active_folder(&self) -> Option<&str> {
        self.active_folder.as_deref()
    }

    /// Opens the transport and reads the greeting (STARTTLS included).
    ///
    /// No-op when already connected.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let config = self.account.connect_config();
        debug!(host = %config.host, port = config.port, "connecting");

        let stream = open(&config).await?;
        let mut session = Session::greet(stream, config.stream_timeout).await?;

        if self.account.encryption == mailhaven_imap::Encryption::StartTls {
            session = session
                .starttls(&self.account.host, self.account.validate_cert)
                .await?;
        }
        if session.capabilities().is_empty() {
            session.capability().await?;
        }

        self.state = ConnectionState::Connected(session);
        Ok(())
    }

    /// Authenticates with the configured method.
    pub async fn authenticate(&mut self) -> Result<()> {
        if matches!(
            self.state,
            ConnectionState::Authenticated(_) | ConnectionState::Selected(_)
        ) {
            return Ok(());
        }

        let session = match std::mem::replace(&mut self.state, ConnectionState::Disconnected) {
            ConnectionState::Connected(session) => session,
            other => {
                let name = other.name();
                self.state = other;
                return Err(Error::Runtime(format!("cannot authenticate while {name}")));
            }
        };

        let username = self.account.username.clone();
        let secret = self.account.password.clone();

        let authenticated = match self.account.authentication {
            AuthMethod::Login => session.login(&username, &secret).await,
            AuthMethod::Plain => session.authenticate_plain(&username, &secret).await,
            AuthMethod::Oauth => session.authenticate_xoauth2(&username, &secret).await,
        }
        .map_err(Error::from)?;

        self.state = ConnectionState::Authenticated(authenticated);
        Ok(())
    }

    /// Logs out and tears the transport down.
    pub async fn disconnect(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, ConnectionState::LoggedOut) {
            ConnectionState::Connected(session) => {
                let _ = session.logout().await;
            }
            ConnectionState::Authenticated(session) => {
                let _ = session.logout().await;
            }
            ConnectionState::Selected(session) => {
                let _ = session.logout().await;
            }
            ConnectionState::Disconnected | ConnectionState::LoggedOut => {}
        }
        self.active_folder = None;
        self.uid_cache.clear();
        Ok(())
    }

    /// Disconnects and connects again with the same configuration,
    /// restoring the previously open folder.
    pub async fn reconnect(&mut self) -> Result<()> {
        let previous = self.active_folder.clone();
        self.disconnect().await?;
        self.state = ConnectionState::Disconnected;
        self.connect().await?;
        self.authenticate().await?;
        if let Some(folder) = previous {
            self.open_folder(&folder, true).await?;
        }
        Ok(())
    }

    /// Re-establishes the session if it is gone; called on entry to
    /// every command-issuing API.
    pub async fn check_connection(&mut self) -> Result<()> {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::LoggedOut => {
                debug!("session not connected, reconnecting");
                self.state = ConnectionState::Disconnected;
                self.connect().await?;
                self.authenticate().await
            }
            ConnectionState::Connected(_) => self.authenticate().await,
            ConnectionState::Authenticated(_) | ConnectionState::Selected(_) => Ok(()),
        }
    }

    // === Folder surface ===

    /// Fetches a single folder by name.
    pub async fn get_folder(&mut self, name: &str) -> Result<Folder> {
        self.check_connection().await?;
        let delimiter = self.options.delimiter;
        let entries = with_session!(self, session => session
            .list("", name)
            .await
            .map_err(|e| Error::FolderFetchingFailed(e.to_string()))?);

        entries
            .first()
            .map(|entry| Folder::from_entry(entry, delimiter))
            .ok_or_else(|| Error::FolderFetchingFailed(format!("no such folder: {name}")))
    }

    /// Enumerates folders, optionally assembled into a tree.
    pub async fn get_folders(&mut self, hierarchical: bool) -> Result<Vec<Folder>> {
        self.check_connection().await?;
        let delimiter = self.options.delimiter;
        let entries = with_session!(self, session => session
            .list("", "*")
            .await
            .map_err(|e| Error::FolderFetchingFailed(e.to_string()))?);

        let folders: Vec<Folder> = entries
            .iter()
            .map(|entry| Folder::from_entry(entry, delimiter))
            .collect();

        if hierarchical {
            Ok(Folder::assemble_tree(folders))
        } else {
            Ok(folders)
        }
    }

    /// Enumerates the folders below a parent, optionally as a tree.
    pub async fn get_folders_within(
        &mut self,
        parent: &str,
        hierarchical: bool,
    ) -> Result<Vec<Folder>> {
        self.check_connection().await?;
        let delimiter = self.options.delimiter;
        let pattern = format!("{parent}{delimiter}*");
        let entries = with_session!(self, session => session
            .list("", &pattern)
            .await
            .map_err(|e| Error::FolderFetchingFailed(e.to_string()))?);

        let folders: Vec<Folder> = entries
            .iter()
            .map(|entry| Folder::from_entry(entry, delimiter))
            .collect();

        if hierarchical {
            Ok(Folder::assemble_tree(folders))
        } else {
            Ok(folders)
        }
    }

    /// Enumerates subscribed folders.
    pub async fn get_subscribed_folders(&mut self) -> Result<Vec<Folder>> {
        self.check_connection().await?;
        let delimiter = self.options.delimiter;
        let entries = with_session!(self, session => session
            .lsub("", "*")
            .await
            .map_err(|e| Error::FolderFetchingFailed(e.to_string()))?);

        Ok(entries
            .iter()
            .map(|entry| Folder::from_entry(entry, delimiter))
            .collect())
    }

    /// Creates a folder and emits `folder.new`.
    pub async fn create_folder(&mut self, name: &str) -> Result<Folder> {
        self.check_connection().await?;
        let mailbox = Mailbox::new(name);
        with_session!(self, session => session.create(&mailbox).await?);
        self.events.emit(&EventPayload::folder_new(name));
        self.get_folder(name).await
    }

    /// Deletes a folder and emits `folder.deleted`.
    pub async fn delete_folder(&mut self, name: &str) -> Result<()> {
        self.check_connection().await?;
        if self.active_folder.as_deref() == Some(name) {
            self.close_active().await?;
        }
        let mailbox = Mailbox::new(name);
        with_session!(self, session => session.delete(&mailbox).await?);
        self.events.emit(&EventPayload::folder_deleted(name));
        Ok(())
    }

    /// Renames (moves) a folder and emits `folder.moved`.
    pub async fn rename_folder(&mut self, from: &str, to: &str) -> Result<()> {
        self.check_connection().await?;
        if self.active_folder.as_deref() == Some(from) {
            self.close_active().await?;
        }
        let (from_mb, to_mb) = (Mailbox::new(from), Mailbox::new(to));
        with_session!(self, session => session.rename(&from_mb, &to_mb).await?);
        self.events.emit(&EventPayload::folder_moved(from, to));
        Ok(())
    }

    /// Subscribes to a folder.
    pub async fn subscribe_folder(&mut self, name: &str) -> Result<()> {
        self.check_connection().await?;
        let mailbox = Mailbox::new(name);
        with_session!(self, session => session.subscribe(&mailbox).await?);
        Ok(())
    }

    /// Unsubscribes from a folder.
    pub async fn unsubscribe_folder(&mut self, name: &str) -> Result<()> {
        self.check_connection().await?;
        let mailbox = Mailbox::new(name);
        with_session!(self, session => session.unsubscribe(&mailbox).await?);
        Ok(())
    }

    /// Queries folder counters without selecting it.
    pub async fn folder_status(&mut self, name: &str) -> Result<Vec<StatusItem>> {
        self.check_connection().await?;
        let mailbox = Mailbox::new(name);
        let items = vec![
            StatusQuery::Messages,
            StatusQuery::Recent,
            StatusQuery::Unseen,
            StatusQuery::UidNext,
            StatusQuery::UidValidity,
        ];
        Ok(with_session!(self, session => session.status(&mailbox, items).await?))
    }

    /// Selects a folder.
    ///
    /// A repeated open of the already-active folder is a no-op unless
    /// `force_select` is set.
    pub async fn open_folder(&mut self, name: &str, force_select: bool) -> Result<SelectedState> {
        self.check_connection().await?;

        if !force_select
            && self.active_folder.as_deref() == Some(name)
            && matches!(self.state, ConnectionState::Selected(_))
        {
            return Ok(SelectedState::default());
        }

        let mailbox = Mailbox::new(name);
        let (session, state) =
            match std::mem::replace(&mut self.state, ConnectionState::Disconnected) {
                ConnectionState::Authenticated(session) => session.select(&mailbox).await?,
                ConnectionState::Selected(session) => session.select(&mailbox).await?,
                other => {
                    self.state = other;
                    return Err(Error::Runtime("no authenticated session".to_string()));
                }
            };

        self.state = ConnectionState::Selected(session);
        self.active_folder = Some(name.to_string());
        self.uid_cache
            .retag(state.uid_validity.map(mailhaven_imap::UidValidity::get));
        Ok(state)
    }

    /// Opens a folder read-only via EXAMINE.
    pub async fn examine_folder(&mut self, name: &str) -> Result<SelectedState> {
        self.check_connection().await?;

        let mailbox = Mailbox::new(name);
        let (session, state) =
            match std::mem::replace(&mut self.state, ConnectionState::Disconnected) {
                ConnectionState::Authenticated(session) => session.examine(&mailbox).await?,
                ConnectionState::Selected(session) => {
                    let authenticated = session.close().await?;
                    authenticated.examine(&mailbox).await?
                }
                other => {
                    self.state = other;
                    return Err(Error::Runtime("no authenticated session".to_string()));
                }
            };

        self.state = ConnectionState::Selected(session);
        self.active_folder = Some(name.to_string());
        self.uid_cache
            .retag(state.uid_validity.map(mailhaven_imap::UidValidity::get));
        Ok(state)
    }

    /// Expunges the active folder.
    pub async fn expunge(&mut self) -> Result<Vec<u32>> {
        self.check_connection().await?;
        let expunged = self.selected_mut()?.expunge().await?;
        self.uid_cache.clear();
        Ok(expunged.iter().map(|s| s.get()).collect())
    }

    /// Appends a message and emits `message.new`; returns the new UID
    /// when the server reports one.
    pub async fn append(
        &mut self,
        folder: &str,
        flags: Option<Vec<Flag>>,
        message: &[u8],
    ) -> Result<Option<u32>> {
        self.check_connection().await?;
        let mailbox = Mailbox::new(folder);
        let appended =
            with_session!(self, session => session.append(&mailbox, flags, message).await?);
        let uid = appended.map(|(_, uid)| uid.get());
        self.events.emit(&EventPayload::message_new(folder, uid));
        Ok(uid)
    }

    /// Fetches quota usage for the account root.
    pub async fn get_quota(&mut self) -> Result<Vec<Quota>> {
        self.check_connection().await?;
        Ok(with_session!(self, session => session.get_quota("").await?))
    }

    /// Resolves quota roots for a folder.
    pub async fn get_quota_root(&mut self, folder: &str) -> Result<(Vec<String>, Vec<Quota>)> {
        self.check_connection().await?;
        let mailbox = Mailbox::new(folder);
        Ok(with_session!(self, session => session.get_quota_root(&mailbox).await?))
    }

    /// Exchanges ID information with the server.
    pub async fn id(
        &mut self,
        parameters: Option<Vec<(String, String)>>,
    ) -> Result<Vec<(String, String)>> {
        self.check_connection().await?;
        Ok(with_session!(self, session => session.id(parameters).await?))
    }

    /// Starts a query against a folder.
    #[must_use]
    pub fn search(&self, folder: &str) -> Query {
        Query::new(folder, &self.options)
    }

    // === Message mutation surface used by folders and queries ===

    /// Sets or clears a flag on messages; emits flag events.
    pub async fn store_flags(
        &mut self,
        folder: &str,
        ids: &[u32],
        flag: Flag,
        add: bool,
    ) -> Result<()> {
        self.check_connection().await?;
        self.open_folder(folder, false).await?;

        let action = if add {
            StoreAction::Add(vec![flag.clone()])
        } else {
            StoreAction::Remove(vec![flag.clone()])
        };

        let uid_mode = self.options.sequence == SequenceKind::Uid;
        let session = self.selected_mut()?;
        if uid_mode {
            let set = UidSet::from_numbers(ids)
                .ok_or_else(|| Error::Runtime("empty identifier set".to_string()))?;
            session.uid_store(&set, action, true).await?;
        } else {
            let set = SequenceSet::from_numbers(ids)
                .ok_or_else(|| Error::Runtime("empty identifier set".to_string()))?;
            session.store(&set, action, true).await?;
        }

        for &id in ids {
            let payload = if add {
                EventPayload::flag_new(folder, id, flag.clone())
            } else {
                EventPayload::flag_deleted(folder, id, flag.clone())
            };
            self.events.emit(&payload);
            if matches!(flag, Flag::Deleted) {
                let message_event = if add {
                    EventPayload::message_deleted(folder, id)
                } else {
                    EventPayload::message_restored(folder, id)
                };
                self.events.emit(&message_event);
            }
        }
        Ok(())
    }

    /// Copies messages to another folder; emits `message.copied`.
    pub async fn copy_messages(&mut self, folder: &str, ids: &[u32], to: &str) -> Result<()> {
        self.check_connection().await?;
        self.open_folder(folder, false).await?;

        let destination = Mailbox::new(to);
        let uid_mode = self.options.sequence == SequenceKind::Uid;
        let session = self.selected_mut()?;
        if uid_mode {
            let set = UidSet::from_numbers(ids)
                .ok_or_else(|| Error::Runtime("empty identifier set".to_string()))?;
            session.uid_copy(&set, &destination).await?;
        } else {
            let set = SequenceSet::from_numbers(ids)
                .ok_or_else(|| Error::Runtime("empty identifier set".to_string()))?;
            session.copy(&set, &destination).await?;
        }

        for &id in ids {
            self.events
                .emit(&EventPayload::message_copied(folder, to, id));
        }
        Ok(())
    }

    /// Moves messages to another folder; emits `message.moved`.
    pub async fn move_messages(&mut self, folder: &str, ids: &[u32], to: &str) -> Result<()> {
        self.check_connection().await?;
        self.open_folder(folder, false).await?;

        let destination = Mailbox::new(to);
        let uid_mode = self.options.sequence == SequenceKind::Uid;
        let session = self.selected_mut()?;
        if uid_mode {
            let set = UidSet::from_numbers(ids)
                .ok_or_else(|| Error::Runtime("empty identifier set".to_string()))?;
            session.uid_move(&set, &destination).await?;
        } else {
            let set = SequenceSet::from_numbers(ids)
                .ok_or_else(|| Error::Runtime("empty identifier set".to_string()))?;
            session.r#move(&set, &destination).await?;
        }

        for &id in ids {
            self.events
                .emit(&EventPayload::message_moved(folder, to, id));
        }
        Ok(())
    }

    // === UID cache ===

    /// Records an MSN↔UID pairing observed in a FETCH response.
    pub(crate) fn note_uid(&mut self, msn: u32, uid: u32) {
        if self.options.uid_cache {
            self.uid_cache.note(msn, uid);
        }
    }

    /// Cached UID for a sequence number.
    #[must_use]
    pub fn uid_for(&self, msn: u32) -> Option<u32> {
        self.uid_cache.msn_to_uid.get(&msn).copied()
    }

    /// Cached sequence number for a UID.
    #[must_use]
    pub fn msgno_for(&self, uid: u32) -> Option<u32> {
        self.uid_cache.uid_to_msn.get(&uid).copied()
    }

    // === Internal session access ===

    /// Executes SEARCH in the active folder.
    pub(crate) async fn run_search(
        &mut self,
        criteria: &SearchCriteria,
        charset: Option<&str>,
        uid: bool,
    ) -> Result<Vec<u32>> {
        self.selected_mut()?
            .search(criteria, charset, uid)
            .await
            .map_err(Into::into)
    }

    pub(crate) fn selected_mut(&mut self) -> Result<&mut Session<ImapStream, Selected>> {
        match &mut self.state {
            ConnectionState::Selected(session) => Ok(session),
            other => Err(Error::Runtime(format!(
                "no folder selected (session is {})",
                other.name()
            ))),
        }
    }

    async fn close_active(&mut self) -> Result<()> {
        if let ConnectionState::Selected(session) =
            std::mem::replace(&mut self.state, ConnectionState::Disconnected)
        {
            match session.close().await {
                Ok(authenticated) => self.state = ConnectionState::Authenticated(authenticated),
                Err(e) => {
                    warn!(error = %e, "CLOSE failed, dropping connection");
                    return Err(e.into());
                }
            }
        }
        self.active_folder = None;
        self.uid_cache.clear();
        Ok(())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.account.host)
            .field("state", &self.state.name())
            .field("active_folder", &self.active_folder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountConfig;

    #[test]
    fn uid_cache_round_trip() {
        let mut cache = UidCache::default();
        cache.retag(Some(100));
        cache.note(1, 1001);
        cache.note(2, 1002);
        assert_eq!(cache.msn_to_uid.get(&1), Some(&1001));
        assert_eq!(cache.uid_to_msn.get(&1002), Some(&2));
    }

    #[test]
    fn uid_cache_flushed_on_validity_change() {
        let mut cache = UidCache::default();
        cache.retag(Some(100));
        cache.note(1, 1001);
        cache.retag(Some(101));
        assert!(cache.msn_to_uid.is_empty());
        assert!(cache.uid_to_msn.is_empty());

        // Same validity keeps entries
        cache.note(1, 2001);
        cache.retag(Some(101));
        assert_eq!(cache.msn_to_uid.get(&1), Some(&2001));
    }

    #[test]
    fn new_client_starts_disconnected() {
        let client = Client::new(AccountConfig::new("imap.example.com"), Options::default());
        assert!(!client.is_connected());
        assert!(client.active_folder().is_none());
    }

    #[test]
    fn clone_session_shares_config_not_state() {
        let mut client = Client::new(
            AccountConfig::new("imap.example.com").credentials("a", "b"),
            Options::default(),
        );
        client.active_folder = Some("INBOX".to_string());

        let twin = client.clone_session();
        assert_eq!(twin.account().host, "imap.example.com");
        assert_eq!(twin.account().username, "a");
        assert!(twin.active_folder().is_none());
        assert!(!twin.is_connected());
    }
}
