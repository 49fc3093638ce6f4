//! Lifecycle event hooks.
//!
//! Handlers are registered by section and event name and dispatched
//! synchronously, in registration order, after the triggering command
//! completes. Handler behaviour never affects that command.

use mailhaven_imap::types::Flag;

/// Identifies one hook point as `(section, name)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `message.new`
    MessageNew,
    /// `message.moved`
    MessageMoved,
    /// `message.copied`
    MessageCopied,
    /// `message.deleted`
    MessageDeleted,
    /// `message.restored`
    MessageRestored,
    /// `folder.new`
    FolderNew,
    /// `folder.moved`
    FolderMoved,
    /// `folder.deleted`
    FolderDeleted,
    /// `flag.new`
    FlagNew,
    /// `flag.deleted`
    FlagDeleted,
}

impl EventKind {
    /// Resolves a `(section, name)` pair.
    #[must_use]
    pub fn resolve(section: &str, name: &str) -> Option<Self> {
        match (section, name) {
            ("message", "new") => Some(Self::MessageNew),
            ("message", "moved") => Some(Self::MessageMoved),
            ("message", "copied") => Some(Self::MessageCopied),
            ("message", "deleted") => Some(Self::MessageDeleted),
            ("message", "restored") => Some(Self::MessageRestored),
            ("folder", "new") => Some(Self::FolderNew),
            ("folder", "moved") => Some(Self::FolderMoved),
            ("folder", "deleted") => Some(Self::FolderDeleted),
            ("flag", "new") => Some(Self::FlagNew),
            ("flag", "deleted") => Some(Self::FlagDeleted),
            _ => None,
        }
    }

    /// The section half of the key.
    #[must_use]
    pub const fn section(self) -> &'static str {
        match self {
            Self::MessageNew
            | Self::MessageMoved
            | Self::MessageCopied
            | Self::MessageDeleted
            | Self::MessageRestored => "message",
            Self::FolderNew | Self::FolderMoved | Self::FolderDeleted => "folder",
            Self::FlagNew | Self::FlagDeleted => "flag",
        }
    }
}

/// Data carried to handlers.
#[derive(Debug, Clone)]
pub struct EventPayload {
    /// Which hook fired.
    pub kind: EventKind,
    /// Folder the event happened in.
    pub folder: String,
    /// Destination folder for moved/copied events.
    pub destination: Option<String>,
    /// Message identifier (UID or MSN per the session options).
    pub id: Option<u32>,
    /// The flag for flag events.
    pub flag: Option<Flag>,
}

impl EventPayload {
    fn new(kind: EventKind, folder: &str) -> Self {
        Self {
            kind,
            folder: folder.to_string(),
            destination: None,
            id: None,
            flag: None,
        }
    }

    pub(crate) fn message_new(folder: &str, id: Option<u32>) -> Self {
        let mut payload = Self::new(EventKind::MessageNew, folder);
        payload.id = id;
        payload
    }

    pub(crate) fn message_moved(folder: &str, destination: &str, id: u32) -> Self {
        let mut payload = Self::new(EventKind::MessageMoved, folder);
        payload.destination = Some(destination.to_string());
        payload.id = Some(id);
        payload
    }

    pub(crate) fn message_copied(folder: &str, destination: &str, id: u32) -> Self {
        let mut payload = Self::new(EventKind::MessageCopied, folder);
        payload.destination = Some(destination.to_string());
        payload.id = Some(id);
        payload
    }

    pub(crate) fn message_deleted(folder: &str, id: u32) -> Self {
        let mut payload = Self::new(EventKind::MessageDeleted, folder);
        payload.id = Some(id);
        payload
    }

    pub(crate) fn message_restored(folder: &str, id: u32) -> Self {
        let mut payload = Self::new(EventKind::MessageRestored, folder);
        payload.id = Some(id);
        payload
    }

    pub(crate) fn folder_new(folder: &str) -> Self {
        Self::new(EventKind::FolderNew, folder)
    }

    pub(crate) fn folder_moved(folder: &str, destination: &str) -> Self {
        let mut payload = Self::new(EventKind::FolderMoved, folder);
        payload.destination = Some(destination.to_string());
        payload
    }

    pub(crate) fn folder_deleted(folder: &str) -> Self {
        Self::new(EventKind::FolderDeleted, folder)
    }

    pub(crate) fn flag_new(folder: &str, id: u32, flag: Flag) -> Self {
        let mut payload = Self::new(EventKind::FlagNew, folder);
        payload.id = Some(id);
        payload.flag = Some(flag);
        payload
    }

    pub(crate) fn flag_deleted(folder: &str, id: u32, flag: Flag) -> Self {
        let mut payload = Self::new(EventKind::FlagDeleted, folder);
        payload.id = Some(id);
        payload.flag = Some(flag);
        payload
    }
}

type Handler = Box<dyn Fn(&EventPayload) + Send + Sync>;

/// Per-client handler registry.
#[derive(Default)]
pub struct EventRegistry {
    handlers: Vec<(EventKind, Handler)>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for an event kind.
    pub fn on<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.handlers.push((kind, Box::new(handler)));
    }

    /// Registers by `(section, name)` strings as used in configuration.
    ///
    /// Unknown pairs are ignored and reported false.
    pub fn on_named<F>(&mut self, section: &str, name: &str, handler: F) -> bool
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        match EventKind::resolve(section, name) {
            Some(kind) => {
                self.on(kind, handler);
                true
            }
            None => false,
        }
    }

    /// Dispatches to matching handlers in registration order.
    pub fn emit(&self, payload: &EventPayload) {
        for (kind, handler) in &self.handlers {
            if *kind == payload.kind {
                handler(payload);
            }
        }
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn resolve_section_names() {
        assert_eq!(
            EventKind::resolve("message", "new"),
            Some(EventKind::MessageNew)
        );
        assert_eq!(EventKind::resolve("flag", "deleted"), Some(EventKind::FlagDeleted));
        assert_eq!(EventKind::resolve("message", "bogus"), None);
        assert_eq!(EventKind::MessageMoved.section(), "message");
    }

    #[test]
    fn dispatch_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = EventRegistry::new();

        for label in ["first", "second"] {
            let order = Arc::clone(&order);
            registry.on(EventKind::MessageNew, move |_| {
                order.lock().unwrap().push(label);
            });
        }

        registry.emit(&EventPayload::message_new("INBOX", Some(1)));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn only_matching_kind_fires() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut registry = EventRegistry::new();

        let counter = Arc::clone(&hits);
        registry.on(EventKind::FolderDeleted, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.emit(&EventPayload::folder_new("Archive"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        registry.emit(&EventPayload::folder_deleted("Archive"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn named_registration() {
        let mut registry = EventRegistry::new();
        assert!(registry.on_named("folder", "moved", |_| {}));
        assert!(!registry.on_named("calendar", "new", |_| {}));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn payload_carries_destination_and_flag() {
        let payload = EventPayload::message_moved("INBOX", "Archive", 7);
        assert_eq!(payload.destination.as_deref(), Some("Archive"));
        assert_eq!(payload.id, Some(7));

        let payload = EventPayload::flag_new("INBOX", 7, Flag::Seen);
        assert_eq!(payload.flag, Some(Flag::Seen));
    }
}
