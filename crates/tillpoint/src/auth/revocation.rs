//! Revoked-token store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Process-wide set of revoked tokens.
///
/// Cloning yields another handle to the same set. Each entry remembers when
/// the revoked token would have expired on its own; past that instant the
/// signature check rejects the token anyway, so `purge_expired` can drop it.
/// State is in-memory only and does not survive a restart.
#[derive(Debug, Clone, Default)]
pub struct RevocationStore {
    entries: Arc<DashMap<String, i64>>,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `token` for the lifetime of the process. Idempotent.
    pub fn revoke(&self, token: &str) {
        self.revoke_until(token, i64::MAX);
    }

    /// Revoke `token`, keeping the entry until `expires_at` (Unix seconds).
    ///
    /// Revoking an already revoked token never shortens its entry.
    pub fn revoke_until(&self, token: &str, expires_at: i64) {
        self.entries
            .entry(token.to_string())
            .and_modify(|current| *current = (*current).max(expires_at))
            .or_insert(expires_at);
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    /// Drop entries whose token has expired by `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Purge expired entries every `every` on the current tokio runtime.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired(Utc::now().timestamp());
                if purged > 0 {
                    debug!(purged, remaining = store.len(), "Swept expired revocations");
                }
            }
        })
    }
}
