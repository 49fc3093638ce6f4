//! Long-lived push notification via IDLE.
//!
//! The watcher runs on a cloned client so the caller's primary session
//! stays free for command traffic. It re-issues IDLE on a keepalive
//! interval (some servers drop idle connections silently), reconnects on
//! stream timeouts and connection loss, and honours a cooperative stop
//! token between reads.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use mailhaven_imap::IdleEvent;

use crate::client::Client;
use crate::config::SequenceKind;
use crate::error::Result;

/// Notification passed to the watcher callback on `EXISTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleNotice {
    /// New message count from the `EXISTS` line.
    pub msgn: u32,
    /// Numbering scheme the session runs with.
    pub sequence: SequenceKind,
    /// Keepalive interval until the next DONE/IDLE cycle.
    pub next_ttl: Duration,
}

/// IDLE loop bound to one folder.
pub struct IdleWatcher {
    client: Client,
    folder: String,
    ttl: Duration,
    stop: CancellationToken,
}

impl IdleWatcher {
    /// Builds a watcher for the folder on a clone of the given client.
    #[must_use]
    pub fn new(client: &Client, folder: impl Into<String>, ttl: Duration) -> Self {
        Self {
            client: client.clone_session(),
            folder: folder.into(),
            ttl,
            stop: CancellationToken::new(),
        }
    }

    /// Token the owner can cancel to stop the loop between reads.
    #[must_use]
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Runs the loop until the stop token fires.
    ///
    /// The callback is invoked for every `EXISTS` pushed by the server.
    /// Keepalive expiry and stream timeouts cycle the connection without
    /// surfacing an error to the callback.
    pub async fn run<F>(mut self, mut on_exists: F) -> Result<()>
    where
        F: FnMut(IdleNotice),
    {
        let sequence = self.client.options().sequence;
        let stream_timeout = self.client.account().stream_timeout;

        loop {
            if self.stop.is_cancelled() {
                return self.client.disconnect().await;
            }

            if let Err(e) = self.establish().await {
                warn!(error = %e, folder = %self.folder, "IDLE setup failed, retrying");
                if self.stop.is_cancelled() {
                    return Ok(());
                }
                tokio::time::sleep(Duration::from_secs(2)).await;
                continue;
            }

            let ttl = self.ttl;
            let cycle_start = Instant::now();
            let mut stopping = false;

            let session = match self.client.selected_mut() {
                Ok(session) => session,
                Err(_) => continue,
            };
            let mut handle = match session.idle().await {
                Ok(handle) => handle,
                Err(e) => {
                    warn!(error = %e, "IDLE command rejected, reconnecting");
                    self.client.disconnect().await.ok();
                    continue;
                }
            };

            // Inner read loop; leaves by keepalive expiry, error, or stop
            loop {
                if self.stop.is_cancelled() {
                    stopping = true;
                    break;
                }

                let elapsed = cycle_start.elapsed();
                if elapsed >= ttl {
                    debug!(folder = %self.folder, "keepalive expired, cycling IDLE");
                    break;
                }
                let wait = (ttl - elapsed).min(stream_timeout);

                match handle.wait(wait).await {
                    Ok(IdleEvent::Exists(msgn)) => on_exists(IdleNotice {
                        msgn,
                        sequence,
                        next_ttl: ttl,
                    }),
                    // The TTL check above decides when to cycle
                    Ok(IdleEvent::Timeout) => {}
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "IDLE read failed, reconnecting");
                        break;
                    }
                }
            }

            // End the outstanding IDLE politely; reconnecting covers a
            // server that already dropped us.
            if let Err(e) = handle.done().await {
                debug!(error = %e, "DONE handshake failed");
            }

            if stopping {
                return self.client.disconnect().await;
            }

            // Some servers drop IDLE silently; a fresh session per cycle
            // is what keeps the push channel actually alive.
            self.client.disconnect().await.ok();
        }
    }

    async fn establish(&mut self) -> Result<()> {
        self.client.check_connection().await?;
        self.client.open_folder(&self.folder, false).await?;
        Ok(())
    }
}

impl std::fmt::Debug for IdleWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleWatcher")
            .field("folder", &self.folder)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
