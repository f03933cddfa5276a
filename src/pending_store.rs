//! # Pending Bet Store Module
//!
//! In-memory storage for bet slips awaiting a stake percentage, one per user.
//!
//! The store is shared by every conversation, so each operation takes one
//! short lock and never holds it across an `.await`. Entries older than the
//! configured time-to-live are treated as absent by [`PendingBetStore::get`]
//! and dropped by the periodic sweep started with [`spawn_sweeper`].

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::bet_slip::BetSlip;

/// Opaque identity of the user a conversation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an already uploaded screenshot (a Telegram file id)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A parsed slip waiting for its stake percentage
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBet {
    pub user_id: UserId,
    pub photo: PhotoRef,
    pub slip: BetSlip,
    pub created_at: DateTime<Utc>,
}

impl PendingBet {
    pub fn new(user_id: UserId, photo: PhotoRef, slip: BetSlip, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            photo,
            slip,
            created_at,
        }
    }

    /// Whether this entry is older than `ttl` at `now`
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.created_at > ttl,
            // A TTL beyond chrono's range never expires
            Err(_) => false,
        }
    }
}

/// Thread-safe map from user to pending bet with expiry
#[derive(Debug)]
pub struct PendingBetStore {
    entries: Mutex<HashMap<UserId, PendingBet>>,
    ttl: Duration,
}

impl PendingBetStore {
    /// Create an empty store whose entries expire after `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, PendingBet>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a slip for `user_id` created now, replacing any previous one
    pub fn put(&self, user_id: UserId, slip: BetSlip, photo: PhotoRef) {
        self.insert(PendingBet::new(user_id, photo, slip, Utc::now()));
    }

    /// Store a fully built pending bet, replacing any previous one for the same user
    pub fn insert(&self, pending: PendingBet) {
        let user_id = pending.user_id;
        if self.lock().insert(user_id, pending).is_some() {
            debug!(user_id = %user_id, "Replaced pending bet with a newer screenshot");
        }
    }

    /// Current pending bet for `user_id`; expired entries are removed and reported as absent
    pub fn get(&self, user_id: UserId) -> Option<PendingBet> {
        self.get_at(user_id, Utc::now())
    }

    /// Same as [`get`](Self::get) with an explicit clock reading
    pub fn get_at(&self, user_id: UserId, now: DateTime<Utc>) -> Option<PendingBet> {
        let mut entries = self.lock();
        let expired = entries.get(&user_id)?.is_expired(self.ttl, now);
        if expired {
            entries.remove(&user_id);
            debug!(user_id = %user_id, "Pending bet expired on lookup");
            return None;
        }
        entries.get(&user_id).cloned()
    }

    /// Remove and return the pending bet for `user_id`
    ///
    /// Whoever receives `Some` owns the terminal transition for that bet.
    pub fn remove(&self, user_id: UserId) -> Option<PendingBet> {
        self.lock().remove(&user_id)
    }

    /// Drop every expired entry, returning how many were dropped
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, pending| !pending.is_expired(self.ttl, now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Run [`PendingBetStore::sweep_expired`] every `interval` until the task is aborted
pub fn spawn_sweeper(store: Arc<PendingBetStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let dropped = store.sweep_expired();
            if dropped > 0 {
                info!(dropped, remaining = store.len(), "Swept expired pending bets");
            }
        }
    })
}
