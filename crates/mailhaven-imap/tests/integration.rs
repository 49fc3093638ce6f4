//! Integration tests driving the session against scripted streams.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailhaven_imap::command::{FetchQuery, FetchSpec, SearchCriteria, StoreAction};
use mailhaven_imap::types::{Flag, Mailbox, SequenceSet, StatusQuery};
use mailhaven_imap::{Capability, FetchItem, ResponseParser, Session};

/// Scripted stream: replays canned responses, captures sent commands.
struct MockStream {
    responses: Cursor<Vec<u8>>,
    sent: Vec<u8>,
}

impl MockStream {
    fn new(responses: &[u8]) -> Self {
        Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Vec::new(),
        }
    }

    fn sent_text(&self) -> String {
        String::from_utf8_lossy(&self.sent).into_owned()
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = usize::try_from(self.responses.position()).unwrap_or(usize::MAX);
        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }
        let remaining = &data[pos..];
        let take = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..take]);
        self.responses.set_position((pos + take) as u64);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn greeting_records_capabilities() {
    let script = b"* OK [CAPABILITY IMAP4rev1 IDLE STARTTLS AUTH=PLAIN] ready\r\n";
    let session = Session::greet(MockStream::new(script), TIMEOUT).await.unwrap();

    assert!(session.has_capability(&Capability::Imap4Rev1));
    assert!(session.supports_idle());
    assert!(session.supports_auth("plain"));
    assert!(!session.supports_quota());
}

#[tokio::test]
async fn bye_greeting_is_fatal() {
    let script = b"* BYE overloaded, try later\r\n";
    let result = Session::greet(MockStream::new(script), TIMEOUT).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn login_then_select_reports_state() {
    let script = b"* OK ready\r\n\
        T0001 OK [CAPABILITY IMAP4rev1 IDLE] LOGIN completed\r\n\
        * 23 EXISTS\r\n\
        * 2 RECENT\r\n\
        * FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
        * OK [UIDVALIDITY 3857529045] UIDs valid\r\n\
        * OK [UIDNEXT 4392] predicted next UID\r\n\
        T0002 OK [READ-WRITE] SELECT completed\r\n";

    let session = Session::greet(MockStream::new(script), TIMEOUT).await.unwrap();
    let session = session.login("user", "pass").await.unwrap();
    assert!(session.supports_idle());

    let (session, state) = session.select(&Mailbox::inbox()).await.unwrap();
    assert_eq!(state.exists, 23);
    assert_eq!(state.recent, 2);
    assert_eq!(state.uid_validity.map(|v| v.get()), Some(3_857_529_045));
    assert_eq!(state.uid_next.map(|u| u.get()), Some(4392));
    assert!(!state.read_only);
    assert_eq!(session.mailbox().as_str(), "INBOX");
}

#[tokio::test]
async fn rejected_login_is_auth_error() {
    let script = b"* OK ready\r\n\
        T0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n";

    let session = Session::greet(MockStream::new(script), TIMEOUT).await.unwrap();
    let err = session.login("user", "hunter2").await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("Authentication failed"));
    // Credentials must never leak into the error
    assert!(!text.contains("hunter2"));
}

#[tokio::test]
async fn search_fetch_store_round_trip() {
    let script = b"* OK ready\r\n\
        T0001 OK LOGIN completed\r\n\
        * 3 EXISTS\r\n\
        T0002 OK SELECT completed\r\n\
        * SEARCH 1 3\r\n\
        T0003 OK SEARCH completed\r\n\
        * 1 FETCH (UID 101 FLAGS (\\Seen))\r\n\
        * 3 FETCH (UID 103 FLAGS ())\r\n\
        T0004 OK FETCH completed\r\n\
        * 3 FETCH (FLAGS (\\Seen))\r\n\
        T0005 OK STORE completed\r\n";

    let session = Session::greet(MockStream::new(script), TIMEOUT).await.unwrap();
    let session = session.login("user", "pass").await.unwrap();
    let (mut session, _) = session.select(&Mailbox::inbox()).await.unwrap();

    let ids = session
        .search(&SearchCriteria::Unseen, None, false)
        .await
        .unwrap();
    assert_eq!(ids, vec![1, 3]);

    let rows = session
        .fetch(
            &SequenceSet::from_numbers(&ids).unwrap(),
            FetchSpec::Items(vec![FetchQuery::Uid, FetchQuery::Flags]),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(matches!(
        rows[0].1[0],
        FetchItem::Uid(uid) if uid.get() == 101
    ));

    let echoes = session
        .store(
            &SequenceSet::single(3).unwrap(),
            StoreAction::Add(vec![Flag::Seen]),
            false,
        )
        .await
        .unwrap();
    assert_eq!(echoes.len(), 1);
}

#[tokio::test]
async fn status_without_select() {
    let script = b"* OK ready\r\n\
        T0001 OK LOGIN completed\r\n\
        * STATUS INBOX (MESSAGES 231 UNSEEN 4)\r\n\
        T0002 OK STATUS completed\r\n";

    let session = Session::greet(MockStream::new(script), TIMEOUT).await.unwrap();
    let mut session = session.login("user", "pass").await.unwrap();

    let items = session
        .status(
            &Mailbox::inbox(),
            vec![StatusQuery::Messages, StatusQuery::Unseen],
        )
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn expunge_collects_sequence_numbers() {
    let script = b"* OK ready\r\n\
        T0001 OK LOGIN completed\r\n\
        T0002 OK SELECT completed\r\n\
        * 3 EXPUNGE\r\n\
        * 3 EXPUNGE\r\n\
        * 5 EXPUNGE\r\n\
        T0003 OK EXPUNGE completed\r\n";

    let session = Session::greet(MockStream::new(script), TIMEOUT).await.unwrap();
    let session = session.login("user", "pass").await.unwrap();
    let (mut session, _) = session.select(&Mailbox::inbox()).await.unwrap();

    let expunged = session.expunge().await.unwrap();
    let nums: Vec<u32> = expunged.iter().map(|s| s.get()).collect();
    assert_eq!(nums, vec![3, 3, 5]);
}

#[tokio::test]
async fn fetch_command_wire_format() {
    // Drive a fetch and assert the exact command bytes that went out
    let script = b"* OK ready\r\n\
        T0001 OK LOGIN completed\r\n\
        T0002 OK SELECT completed\r\n\
        T0003 OK FETCH completed\r\n";

    let session = Session::greet(MockStream::new(script), TIMEOUT).await.unwrap();
    let session = session.login("user", "pass").await.unwrap();
    let (mut session, _) = session.select(&Mailbox::inbox()).await.unwrap();

    let _ = session
        .fetch(
            &SequenceSet::single(1).unwrap(),
            FetchSpec::Items(vec![
                FetchQuery::Uid,
                FetchQuery::Flags,
                FetchQuery::peek("HEADER"),
                FetchQuery::peek("TEXT"),
            ]),
        )
        .await
        .unwrap();

    let sent = session.into_parts_for_test();
    assert!(sent.contains("T0003 FETCH 1 (UID FLAGS BODY.PEEK[HEADER] BODY.PEEK[TEXT])\r\n"));
}

#[test]
fn parser_smoke() {
    let parsed = ResponseParser::parse(b"* 12 FETCH (FLAGS (\\Seen) UID 100)\r\n").unwrap();
    match parsed {
        mailhaven_imap::Response::Untagged(mailhaven_imap::UntaggedResponse::Fetch {
            seq,
            items,
        }) => {
            assert_eq!(seq.get(), 12);
            assert_eq!(items.len(), 2);
        }
        other => panic!("expected FETCH, got {other:?}"),
    }
}

/// Test-only access to the captured wire traffic.
trait SentText {
    fn into_parts_for_test(self) -> String;
}

impl SentText for Session<MockStream, mailhaven_imap::Selected> {
    fn into_parts_for_test(self) -> String {
        // The session owns the framed stream; unwrap it for inspection
        self.into_stream().into_inner().sent_text()
    }
}
