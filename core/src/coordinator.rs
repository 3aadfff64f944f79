// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Reconciles the device contact store into the local cache.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use jiff::Timestamp;
use tokio::sync::watch;
use tracing::Instrument;

use crate::cache::{CacheError, ContactCache};
use crate::device::SourceError;
use crate::ledger::{LedgerError, SyncLedger};
use crate::source::ContactReader;

/// Source of the instant recorded for a successful sync.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// Errors that abort a sync. The ledger is never advanced after one.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to read device contacts: {0}")]
    Read(#[from] SourceError),

    #[error("failed to update contact cache: {0}")]
    Cache(#[from] CacheError),

    #[error("failed to access sync ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("sync task aborted: {0}")]
    Aborted(String),
}

/// Strategy used by a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Every contact was re-read and the cache replaced.
    Full,
    /// Only contacts changed since the last sync were read; deletions were
    /// found by diffing id sets.
    Incremental,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Full => write!(f, "full"),
            SyncMode::Incremental => write!(f, "incremental"),
        }
    }
}

/// Observable state of the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    SyncingFull,
    SyncingIncremental,
}

/// What a completed sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    /// Contacts written to the cache.
    pub upserted: usize,
    /// Contacts removed from the cache.
    pub deleted: usize,
}

impl SyncReport {
    /// Whether the sync wrote or removed anything.
    pub fn has_changes(&self) -> bool {
        self.upserted > 0 || self.deleted > 0
    }
}

/// Result of a sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another sync was in progress; nothing was touched.
    Skipped,
}

/// Runs at most one sync at a time over a reader, a cache and a ledger.
///
/// Clones share the same in-progress guard, so every caller in a process must
/// go through clones of one coordinator.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    reader: ContactReader,
    cache: ContactCache,
    ledger: SyncLedger,
    clock: Clock,
    in_progress: AtomicBool,
    state: watch::Sender<SyncState>,
}

impl fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SyncCoordinator {
    pub fn new(reader: ContactReader, cache: ContactCache, ledger: SyncLedger) -> Self {
        Self::with_clock(reader, cache, ledger, Arc::new(Timestamp::now))
    }

    pub fn with_clock(
        reader: ContactReader,
        cache: ContactCache,
        ledger: SyncLedger,
        clock: Clock,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            inner: Arc::new(Inner {
                reader,
                cache,
                ledger,
                clock,
                in_progress: AtomicBool::new(false),
                state,
            }),
        }
    }

    pub fn cache(&self) -> &ContactCache {
        &self.inner.cache
    }

    pub fn ledger(&self) -> &SyncLedger {
        &self.inner.ledger
    }

    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.in_progress.load(Ordering::SeqCst)
    }

    /// Syncs incrementally when a previous sync is recorded, fully otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn synchronize(&self) -> Result<SyncOutcome, SyncError> {
        self.run(false).await
    }

    /// Always takes the full path, e.g. for a user-triggered refresh.
    #[tracing::instrument(skip(self))]
    pub async fn force_full_sync(&self) -> Result<SyncOutcome, SyncError> {
        self.run(true).await
    }

    /// Claims the in-progress guard without running anything yet, so a caller
    /// can react only when its sync will actually run. `None` means another
    /// sync holds the guard.
    pub fn try_claim(&self, force_full: bool) -> Option<ClaimedSync> {
        let guard = InProgress::acquire(&self.inner)?;
        Some(ClaimedSync { guard, force_full })
    }

    async fn run(&self, force_full: bool) -> Result<SyncOutcome, SyncError> {
        match self.try_claim(force_full) {
            Some(claimed) => claimed.run().await.map(SyncOutcome::Completed),
            None => {
                tracing::debug!("sync already in progress, skipping");
                Ok(SyncOutcome::Skipped)
            }
        }
    }
}

/// A sync that holds the in-progress guard. Dropping it unrun releases the
/// guard.
#[must_use = "a claimed sync does nothing until run"]
pub struct ClaimedSync {
    guard: InProgress,
    force_full: bool,
}

impl fmt::Debug for ClaimedSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimedSync")
            .field("force_full", &self.force_full)
            .finish_non_exhaustive()
    }
}

impl ClaimedSync {
    pub async fn run(self) -> Result<SyncReport, SyncError> {
        let ClaimedSync { guard, force_full } = self;
        // a dropped caller must not tear down writes that are under way
        let inner = guard.inner.clone();
        let task = tokio::spawn(
            async move {
                let _guard = guard;
                inner.sync(force_full).await
            }
            .in_current_span(),
        );

        match task.await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "sync failed");
                Err(e)
            }
            Err(e) => Err(SyncError::Aborted(e.to_string())),
        }
    }
}

impl Inner {
    async fn sync(&self, force_full: bool) -> Result<SyncReport, SyncError> {
        let started = (self.clock)();
        let last = if force_full {
            None
        } else {
            self.ledger.get().await?
        };

        let report = match last {
            None => self.sync_full().await?,
            Some(since) => self.sync_incremental(since).await?,
        };

        self.ledger.set(started).await?;
        tracing::info!(
            mode = %report.mode,
            upserted = report.upserted,
            deleted = report.deleted,
            "contacts synced"
        );
        Ok(report)
    }

    async fn sync_full(&self) -> Result<SyncReport, SyncError> {
        self.state.send_replace(SyncState::SyncingFull);
        let contacts = self.reader.read_full().await?;
        let deleted = self.cache.replace_all(&contacts).await?;
        Ok(SyncReport {
            mode: SyncMode::Full,
            upserted: contacts.len(),
            deleted: deleted as usize,
        })
    }

    async fn sync_incremental(&self, since: Timestamp) -> Result<SyncReport, SyncError> {
        self.state.send_replace(SyncState::SyncingIncremental);
        tracing::debug!(%since, "reading contacts changed since last sync");

        let changed = self.reader.read_changed_since(since).await?;
        if !changed.is_empty() {
            self.cache.upsert(&changed).await?;
        }

        let device_ids = self.reader.read_all_ids().await?;
        let cached_ids = self.cache.all_ids().await?;
        let stale: HashSet<String> = cached_ids.difference(&device_ids).cloned().collect();
        let deleted = if stale.is_empty() {
            0
        } else {
            self.cache.delete_by_ids(&stale).await? as usize
        };

        Ok(SyncReport {
            mode: SyncMode::Incremental,
            upserted: changed.len(),
            deleted,
        })
    }
}

/// Holds the in-progress flag; releasing it returns the coordinator to idle.
struct InProgress {
    inner: Arc<Inner>,
}

impl InProgress {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        inner
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self {
                inner: inner.clone(),
            })
    }
}

impl Drop for InProgress {
    fn drop(&mut self) {
        self.inner.state.send_replace(SyncState::Idle);
        self.inner.in_progress.store(false, Ordering::SeqCst);
    }
}
