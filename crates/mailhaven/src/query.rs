//! Fluent search queries and the fetch-and-populate pipeline.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use mailhaven_imap::command::{FetchQuery, FetchSpec, SearchCriteria};
use mailhaven_imap::types::{SequenceSet, UidSet};

use crate::client::Client;
use crate::config::{FetchMode, FetchOrder, MessageKey, Options, SequenceKind};
use crate::error::{Error, Result};
use crate::message::Message;

/// Messages keyed per the configured [`MessageKey`], in population
/// order.
#[derive(Debug, Default)]
pub struct MessageCollection {
    entries: Vec<(String, Message)>,
}

impl MessageCollection {
    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks a message up by its key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Message> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, m)| m)
    }

    /// Iterates `(key, message)` pairs in population order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Message)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m))
    }

    /// Iterates messages in population order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|(_, m)| m)
    }

    /// First message in population order.
    #[must_use]
    pub fn first(&self) -> Option<&Message> {
        self.entries.first().map(|(_, m)| m)
    }

    fn insert(&mut self, key: String, message: Message) {
        self.entries.push((key, message));
    }
}

impl IntoIterator for MessageCollection {
    type Item = (String, Message);
    type IntoIter = std::vec::IntoIter<(String, Message)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Result of a populate cycle: the collection plus any per-identifier
/// failures recorded in soft-fail mode.
#[derive(Debug, Default)]
pub struct Fetched {
    /// Materialised messages.
    pub messages: MessageCollection,
    /// Identifier → failure reason for messages that did not
    /// materialise.
    pub errors: BTreeMap<u32, String>,
}

/// A search-criteria builder bound to one folder.
///
/// Builder methods mutate and return the query, so a template can be
/// cloned and extended without re-stating the common part.
#[derive(Debug, Clone)]
pub struct Query {
    folder: String,
    criteria: Vec<SearchCriteria>,
    pending_not: bool,
    pending_or: bool,
    charset: Option<String>,
    sequence: SequenceKind,
    fetch_order: FetchOrder,
    fetch_mode: FetchMode,
    message_key: MessageKey,
    fetch_body: bool,
    fetch_flags: bool,
    soft_fail: bool,
    limit: Option<usize>,
    page: usize,
}

impl Query {
    /// Builds an empty query against a folder, seeded from the options.
    #[must_use]
    pub fn new(folder: &str, options: &Options) -> Self {
        Self {
            folder: folder.to_string(),
            criteria: Vec::new(),
            pending_not: false,
            pending_or: false,
            charset: None,
            sequence: options.sequence,
            fetch_order: options.fetch_order,
            fetch_mode: options.fetch,
            message_key: options.message_key,
            fetch_body: true,
            fetch_flags: true,
            soft_fail: options.soft_fail,
            limit: None,
            page: 1,
        }
    }

    /// The folder this query runs against.
    #[must_use]
    pub fn folder(&self) -> &str {
        &self.folder
    }

    fn push(mut self, criterion: SearchCriteria) -> Self {
        let criterion = if self.pending_not {
            self.pending_not = false;
            SearchCriteria::Not(Box::new(criterion))
        } else {
            criterion
        };

        if self.pending_or {
            self.pending_or = false;
            if let Some(previous) = self.criteria.pop() {
                self.criteria
                    .push(SearchCriteria::Or(Box::new(previous), Box::new(criterion)));
                return self;
            }
        }

        self.criteria.push(criterion);
        self
    }

    // === Criteria ===

    /// Matches every message.
    #[must_use]
    pub fn all(self) -> Self {
        self.push(SearchCriteria::All)
    }

    /// `\Answered` set.
    #[must_use]
    pub fn answered(self) -> Self {
        self.push(SearchCriteria::Answered)
    }

    /// `\Deleted` set.
    #[must_use]
    pub fn deleted(self) -> Self {
        self.push(SearchCriteria::Deleted)
    }

    /// `\Draft` set.
    #[must_use]
    pub fn draft(self) -> Self {
        self.push(SearchCriteria::Draft)
    }

    /// `\Flagged` set.
    #[must_use]
    pub fn flagged(self) -> Self {
        self.push(SearchCriteria::Flagged)
    }

    /// Recent and unseen.
    #[must_use]
    pub fn new_messages(self) -> Self {
        self.push(SearchCriteria::New)
    }

    /// Not recent.
    #[must_use]
    pub fn old(self) -> Self {
        self.push(SearchCriteria::Old)
    }

    /// `\Recent` set.
    #[must_use]
    pub fn recent(self) -> Self {
        self.push(SearchCriteria::Recent)
    }

    /// `\Seen` set.
    #[must_use]
    pub fn seen(self) -> Self {
        self.push(SearchCriteria::Seen)
    }

    /// `\Answered` not set.
    #[must_use]
    pub fn unanswered(self) -> Self {
        self.push(SearchCriteria::Unanswered)
    }

    /// `\Deleted` not set.
    #[must_use]
    pub fn undeleted(self) -> Self {
        self.push(SearchCriteria::Undeleted)
    }

    /// `\Draft` not set.
    #[must_use]
    pub fn undraft(self) -> Self {
        self.push(SearchCriteria::Undraft)
    }

    /// `\Flagged` not set.
    #[must_use]
    pub fn unflagged(self) -> Self {
        self.push(SearchCriteria::Unflagged)
    }

    /// `\Seen` not set.
    #[must_use]
    pub fn unseen(self) -> Self {
        self.push(SearchCriteria::Unseen)
    }

    /// Bcc contains.
    #[must_use]
    pub fn bcc(self, value: impl Into<String>) -> Self {
        self.push(SearchCriteria::Bcc(value.into()))
    }

    /// Body contains.
    #[must_use]
    pub fn body(self, value: impl Into<String>) -> Self {
        self.push(SearchCriteria::Body(value.into()))
    }

    /// Cc contains.
    #[must_use]
    pub fn cc(self, value: impl Into<String>) -> Self {
        self.push(SearchCriteria::Cc(value.into()))
    }

    /// From contains.
    #[must_use]
    pub fn from(self, value: impl Into<String>) -> Self {
        self.push(SearchCriteria::From(value.into()))
    }

    /// Subject contains.
    #[must_use]
    pub fn subject(self, value: impl Into<String>) -> Self {
        self.push(SearchCriteria::Subject(value.into()))
    }

    /// Header or body contains.
    #[must_use]
    pub fn text(self, value: impl Into<String>) -> Self {
        self.push(SearchCriteria::Text(value.into()))
    }

    /// To contains.
    #[must_use]
    pub fn to(self, value: impl Into<String>) -> Self {
        self.push(SearchCriteria::To(value.into()))
    }

    /// Named header contains.
    #[must_use]
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(SearchCriteria::Header(name.into(), value.into()))
    }

    /// Keyword flag set.
    #[must_use]
    pub fn keyword(self, value: impl Into<String>) -> Self {
        self.push(SearchCriteria::Keyword(value.into()))
    }

    /// Keyword flag not set.
    #[must_use]
    pub fn unkeyword(self, value: impl Into<String>) -> Self {
        self.push(SearchCriteria::Unkeyword(value.into()))
    }

    /// Larger than n octets.
    #[must_use]
    pub fn larger(self, octets: u32) -> Self {
        self.push(SearchCriteria::Larger(octets))
    }

    /// Smaller than n octets.
    #[must_use]
    pub fn smaller(self, octets: u32) -> Self {
        self.push(SearchCriteria::Smaller(octets))
    }

    /// Internal date before.
    #[must_use]
    pub fn before(self, date: NaiveDate) -> Self {
        self.push(SearchCriteria::Before(date))
    }

    /// Internal date on.
    #[must_use]
    pub fn on(self, date: NaiveDate) -> Self {
        self.push(SearchCriteria::On(date))
    }

    /// Internal date on or after.
    #[must_use]
    pub fn since(self, date: NaiveDate) -> Self {
        self.push(SearchCriteria::Since(date))
    }

    /// Date header before.
    #[must_use]
    pub fn sent_before(self, date: NaiveDate) -> Self {
        self.push(SearchCriteria::SentBefore(date))
    }

    /// Date header on.
    #[must_use]
    pub fn sent_on(self, date: NaiveDate) -> Self {
        self.push(SearchCriteria::SentOn(date))
    }

    /// Date header on or after.
    #[must_use]
    pub fn sent_since(self, date: NaiveDate) -> Self {
        self.push(SearchCriteria::SentSince(date))
    }

    /// UID set match.
    #[must_use]
    pub fn uid(self, set: UidSet) -> Self {
        self.push(SearchCriteria::Uid(set))
    }

    /// Negates the next criterion.
    #[must_use]
    pub const fn not(mut self) -> Self {
        self.pending_not = true;
        self
    }

    /// Combines the previous and the next criterion with OR.
    #[must_use]
    pub const fn or(mut self) -> Self {
        self.pending_or = true;
        self
    }

    // === Behaviour switches ===

    /// Forces the SEARCH CHARSET argument.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Fetches (or skips) bodies during population.
    #[must_use]
    pub const fn fetch_body(mut self, fetch: bool) -> Self {
        self.fetch_body = fetch;
        self
    }

    /// Fetches (or skips) flags during population.
    #[must_use]
    pub const fn fetch_flags(mut self, fetch: bool) -> Self {
        self.fetch_flags = fetch;
        self
    }

    /// Leaves `\Seen` untouched when fetching bodies.
    #[must_use]
    pub const fn peek(mut self, peek: bool) -> Self {
        self.fetch_mode = if peek {
            FetchMode::Peek
        } else {
            FetchMode::Plain
        };
        self
    }

    /// Records per-message errors instead of aborting the batch.
    #[must_use]
    pub const fn soft_fail(mut self, soft: bool) -> Self {
        self.soft_fail = soft;
        self
    }

    /// Reverses the identifier list before paging.
    #[must_use]
    pub const fn descending(mut self) -> Self {
        self.fetch_order = FetchOrder::Desc;
        self
    }

    /// Applies a page limit: `per_page` messages, 1-based `page`.
    #[must_use]
    pub const fn limit(mut self, per_page: usize, page: usize) -> Self {
        self.limit = Some(per_page);
        self.page = if page == 0 { 1 } else { page };
        self
    }

    // === Emission ===

    /// Renders the SEARCH program this query will send.
    ///
    /// Criteria join with single spaces; an empty query is `ALL`.
    #[must_use]
    pub fn generate_query(&self) -> String {
        if self.criteria.is_empty() {
            "ALL".to_string()
        } else {
            self.criteria
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        }
    }

    fn combined_criteria(&self) -> SearchCriteria {
        match self.criteria.as_slice() {
            [] => SearchCriteria::All,
            [single] => single.clone(),
            _ => SearchCriteria::And(self.criteria.clone()),
        }
    }

    /// CHARSET to send: the explicit one, else UTF-8 as soon as any
    /// argument needs a literal.
    fn effective_charset(&self) -> Option<String> {
        self.charset.clone().or_else(|| {
            if self.generate_query().is_ascii() {
                None
            } else {
                Some("UTF-8".to_string())
            }
        })
    }

    // === Execution ===

    /// Runs SEARCH and returns the matched identifiers in server order.
    pub async fn search(&self, client: &mut Client) -> Result<Vec<u32>> {
        client.check_connection().await?;
        client.open_folder(&self.folder, false).await?;

        let criteria = self.combined_criteria();
        let charset = self.effective_charset();
        client
            .run_search(
                &criteria,
                charset.as_deref(),
                self.sequence == SequenceKind::Uid,
            )
            .await
            .map_err(|e| match e {
                Error::Runtime(text) => Error::SearchValidation(text),
                other => other,
            })
    }

    /// Runs the search and materialises every matched message, honouring
    /// order, paging, and soft-fail.
    pub async fn get(&self, client: &mut Client) -> Result<Fetched> {
        let ids = self.ordered_ids(client).await?;
        let page = self.page_slice(&ids);
        self.populate(client, page).await
    }

    /// Applies paging on top of the builder state.
    pub async fn paginate(
        &self,
        client: &mut Client,
        per_page: usize,
        page: usize,
    ) -> Result<Fetched> {
        let paged = self.clone().limit(per_page, page);
        paged.get(client).await
    }

    /// Fetches in windows of `chunk_size`, invoking the callback per
    /// chunk with its 1-based index. Already-processed identifiers are
    /// never refetched. Starting chunk indices below 1 are treated as 1.
    pub async fn chunked<F>(
        &self,
        client: &mut Client,
        mut callback: F,
        chunk_size: usize,
        start: usize,
    ) -> Result<()>
    where
        F: FnMut(MessageCollection, usize),
    {
        if chunk_size == 0 {
            return Err(Error::SearchValidation(
                "chunk size must be at least 1".to_string(),
            ));
        }

        let ids = self.ordered_ids(client).await?;
        let start = start.max(1);

        for (offset, window) in ids.chunks(chunk_size).enumerate() {
            let index = offset + 1;
            if index < start {
                continue;
            }
            let fetched = self.populate(client, window).await?;
            callback(fetched.messages, index);
        }
        Ok(())
    }

    /// Fetches the full identifier set, applies the predicate, and
    /// populates only the selected identifiers.
    pub async fn filter<P>(&self, client: &mut Client, predicate: P) -> Result<Fetched>
    where
        P: Fn(u32) -> bool,
    {
        let ids = self.ordered_ids(client).await?;
        let selected: Vec<u32> = ids.into_iter().filter(|&id| predicate(id)).collect();
        self.populate(client, &selected).await
    }

    async fn ordered_ids(&self, client: &mut Client) -> Result<Vec<u32>> {
        let mut ids = self.search(client).await?;
        if self.fetch_order == FetchOrder::Desc {
            ids.reverse();
        }
        Ok(ids)
    }

    fn page_slice<'a>(&self, ids: &'a [u32]) -> &'a [u32] {
        match self.limit {
            Some(per_page) => {
                let from = (self.page - 1).saturating_mul(per_page).min(ids.len());
                let to = from.saturating_add(per_page).min(ids.len());
                &ids[from..to]
            }
            None => ids,
        }
    }

    fn fetch_spec(&self) -> FetchSpec {
        let peek = self.fetch_mode == FetchMode::Peek;
        let mut items = vec![FetchQuery::Uid];
        if self.fetch_flags {
            items.push(FetchQuery::Flags);
        }
        items.push(FetchQuery::Section {
            section: Some("HEADER".to_string()),
            peek,
            partial: None,
        });
        if self.fetch_body {
            items.push(FetchQuery::Section {
                section: Some("TEXT".to_string()),
                peek,
                partial: None,
            });
        }
        FetchSpec::Items(items)
    }

    async fn populate(&self, client: &mut Client, ids: &[u32]) -> Result<Fetched> {
        let mut fetched = Fetched::default();
        if ids.is_empty() {
            return Ok(fetched);
        }

        client.open_folder(&self.folder, false).await?;

        let spec = self.fetch_spec();
        let rows = if self.sequence == SequenceKind::Uid {
            let set = UidSet::from_numbers(ids)
                .ok_or_else(|| Error::SearchValidation("empty identifier set".to_string()))?;
            client.selected_mut()?.uid_fetch(&set, spec).await?
        } else {
            let set = SequenceSet::from_numbers(ids)
                .ok_or_else(|| Error::SearchValidation("empty identifier set".to_string()))?;
            client.selected_mut()?.fetch(&set, spec).await?
        };

        for (position, (seq, items)) in rows.into_iter().enumerate() {
            let uid = items.iter().find_map(|item| match item {
                mailhaven_imap::parser::FetchItem::Uid(uid) => Some(uid.get()),
                _ => None,
            });
            if let Some(uid) = uid {
                client.note_uid(seq.get(), uid);
            }
            let identifier = if self.sequence == SequenceKind::Uid {
                uid.unwrap_or_else(|| seq.get())
            } else {
                seq.get()
            };

            match Message::from_fetch(seq, &items) {
                Ok(message) => {
                    let key = self.collection_key(&message, position);
                    fetched.messages.insert(key, message);
                }
                Err(e) if self.soft_fail => {
                    warn!(identifier, error = %e, "message failed to materialise");
                    fetched.errors.insert(identifier, e.to_string());
                }
                Err(e) => {
                    let mut errors = BTreeMap::new();
                    errors.insert(identifier, e.to_string());
                    return Err(Error::GetMessagesFailed { errors });
                }
            }
        }

        Ok(fetched)
    }

    fn collection_key(&self, message: &Message, position: usize) -> String {
        match self.message_key {
            MessageKey::Uid => message
                .uid
                .map(|u| u.get().to_string())
                .or_else(|| message.msgno.map(|s| s.get().to_string()))
                .unwrap_or_else(|| position.to_string()),
            MessageKey::Number => message
                .msgno
                .map(|s| s.get().to_string())
                .unwrap_or_else(|| position.to_string()),
            MessageKey::List => position.to_string(),
            MessageKey::Id => message.message_id.clone().unwrap_or_else(|| {
                position.to_string()
            }),
        }
    }
}
