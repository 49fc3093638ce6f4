//! Folder (mailbox) representation and operations.

use mailhaven_imap::types::{ListEntry, NameAttribute, SelectedState, StatusItem};

use crate::client::Client;
use crate::error::Result;
use crate::query::Query;

/// One mailbox, named in UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    /// Full path, e.g. `INBOX/Receipts/2024`.
    pub name: String,
    /// Last path segment.
    pub display_name: String,
    /// Hierarchy delimiter.
    pub delimiter: char,
    /// Attributes from LIST.
    pub attributes: Vec<NameAttribute>,
    /// Child folders, filled by hierarchical enumeration.
    pub children: Vec<Folder>,
}

impl Folder {
    /// Builds a folder from a LIST row.
    #[must_use]
    pub fn from_entry(entry: &ListEntry, fallback_delimiter: char) -> Self {
        let delimiter = entry.delimiter.unwrap_or(fallback_delimiter);
        let name = entry.mailbox.as_str().to_string();
        let display_name = name
            .rsplit(delimiter)
            .next()
            .unwrap_or(name.as_str())
            .to_string();

        Self {
            name,
            display_name,
            delimiter,
            attributes: entry.attributes.clone(),
            children: Vec::new(),
        }
    }

    /// True when LIST flagged the folder `\Noselect`.
    #[must_use]
    pub fn is_no_select(&self) -> bool {
        self.attributes.contains(&NameAttribute::NoSelect)
    }

    /// True when the server reported children, or they were attached.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty() || self.attributes.contains(&NameAttribute::HasChildren)
    }

    /// Replaces the child list.
    pub fn set_children(&mut self, children: Vec<Folder>) {
        self.children = children;
    }

    /// Nests a flat folder list into a tree by path prefix.
    #[must_use]
    pub fn assemble_tree(folders: Vec<Folder>) -> Vec<Folder> {
        let mut roots: Vec<Folder> = Vec::new();

        // LIST output is sorted parent-first on common servers; walk it
        // and attach each entry to the deepest matching parent.
        for folder in folders {
            if !attach(&mut roots, &folder) {
                roots.push(folder);
            }
        }
        roots
    }

    /// Builds a query against this folder.
    #[must_use]
    pub fn query(&self, client: &Client) -> Query {
        client.search(&self.name)
    }

    /// Selects this folder on the client.
    pub async fn select(&self, client: &mut Client) -> Result<SelectedState> {
        client.open_folder(&self.name, false).await
    }

    /// Opens this folder read-only.
    pub async fn examine(&self, client: &mut Client) -> Result<SelectedState> {
        client.examine_folder(&self.name).await
    }

    /// Builds an IDLE watcher bound to this folder.
    ///
    /// The watcher runs on a clone of the client so this session stays
    /// available for commands.
    #[must_use]
    pub fn idle(&self, client: &Client, keepalive: std::time::Duration) -> crate::IdleWatcher {
        crate::IdleWatcher::new(client, &self.name, keepalive)
    }

    /// Queries counters without selecting.
    pub async fn status(&self, client: &mut Client) -> Result<Vec<StatusItem>> {
        client.folder_status(&self.name).await
    }

    /// Expunges deleted messages after selecting this folder.
    pub async fn expunge(&self, client: &mut Client) -> Result<Vec<u32>> {
        client.open_folder(&self.name, false).await?;
        client.expunge().await
    }

    /// Renames (moves) this folder to a new path.
    pub async fn move_to(&self, client: &mut Client, new_name: &str) -> Result<()> {
        client.rename_folder(&self.name, new_name).await
    }

    /// Deletes this folder.
    pub async fn delete(&self, client: &mut Client) -> Result<()> {
        client.delete_folder(&self.name).await
    }

    /// Subscribes to this folder.
    pub async fn subscribe(&self, client: &mut Client) -> Result<()> {
        client.subscribe_folder(&self.name).await
    }
}

fn attach(nodes: &mut [Folder], folder: &Folder) -> bool {
    for node in nodes {
        let prefix = format!("{}{}", node.name, node.delimiter);
        if folder.name.starts_with(&prefix) {
            if !attach(&mut node.children, folder) {
                node.children.push(folder.clone());
            }
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use mailhaven_imap::types::Mailbox;

    use super::*;

    fn entry(name: &str, attrs: Vec<NameAttribute>) -> ListEntry {
        ListEntry {
            attributes: attrs,
            delimiter: Some('/'),
            mailbox: Mailbox::new(name),
        }
    }

    #[test]
    fn display_name_is_last_segment() {
        let folder = Folder::from_entry(&entry("INBOX/Receipts/2024", vec![]), '/');
        assert_eq!(folder.name, "INBOX/Receipts/2024");
        assert_eq!(folder.display_name, "2024");
        assert_eq!(folder.delimiter, '/');
    }

    #[test]
    fn attributes_drive_flags() {
        let folder = Folder::from_entry(
            &entry("Parent", vec![NameAttribute::HasChildren]),
            '/',
        );
        assert!(folder.has_children());
        assert!(!folder.is_no_select());

        let folder = Folder::from_entry(&entry("Virtual", vec![NameAttribute::NoSelect]), '/');
        assert!(folder.is_no_select());
    }

    #[test]
    fn tree_assembly() {
        let folders = vec![
            Folder::from_entry(&entry("INBOX", vec![]), '/'),
            Folder::from_entry(&entry("INBOX/Receipts", vec![]), '/'),
            Folder::from_entry(&entry("INBOX/Receipts/2024", vec![]), '/'),
            Folder::from_entry(&entry("Sent", vec![]), '/'),
        ];

        let tree = Folder::assemble_tree(folders);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "INBOX");
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].children[0].display_name, "2024");
        assert_eq!(tree[1].name, "Sent");
    }

    #[test]
    fn set_children_marks_parent() {
        let mut parent = Folder::from_entry(&entry("Lists", vec![]), '/');
        assert!(!parent.has_children());
        parent.set_children(vec![Folder::from_entry(&entry("Lists/rust", vec![]), '/')]);
        assert!(parent.has_children());
    }
}
