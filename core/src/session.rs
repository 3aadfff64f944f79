// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Session-scoped orchestration of contact syncs.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::Contact;
use crate::coordinator::{SyncCoordinator, SyncOutcome};
use crate::device::PermissionProbe;
use crate::observer::ChangeObserver;

const STATUS_CAPACITY: usize = 32;

/// A short-lived message for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    /// A visible sync started.
    Syncing,
    /// A blocking load finished.
    Synced,
    /// A load failed.
    SyncFailed,
    /// A resume sync brought in changes.
    Updated,
    /// A sync triggered by a device change finished.
    ChangesSynced,
    /// A sync triggered by a device change failed.
    ChangesSyncFailed,
}

impl StatusMessage {
    pub fn text(self) -> &'static str {
        match self {
            StatusMessage::Syncing => "Syncing contacts...",
            StatusMessage::Synced => "Contacts synced successfully",
            StatusMessage::SyncFailed => "Failed to sync contacts",
            StatusMessage::Updated => "Contacts updated",
            StatusMessage::ChangesSynced => "Contacts synced",
            StatusMessage::ChangesSyncFailed => "Sync failed",
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Drives syncs for one app session and exposes what a UI needs to render.
///
/// The controller remembers whether it already loaded contacts and whether it
/// observes device changes. Both flags start cleared for every new controller.
pub struct SessionController {
    coordinator: SyncCoordinator,
    observer: ChangeObserver,
    probe: Arc<dyn PermissionProbe>,
    permission: watch::Sender<bool>,
    loading: watch::Sender<bool>,
    status: broadcast::Sender<StatusMessage>,
    has_loaded: AtomicBool,
    observing: AtomicBool,
    observer_task: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("coordinator", &self.coordinator)
            .field("permission", &*self.permission.borrow())
            .field("loading", &*self.loading.borrow())
            .field("has_loaded", &self.has_loaded.load(Ordering::SeqCst))
            .field("observing", &self.observing.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SessionController {
    pub fn new(
        coordinator: SyncCoordinator,
        observer: ChangeObserver,
        probe: Arc<dyn PermissionProbe>,
    ) -> Self {
        let (status, _) = broadcast::channel(STATUS_CAPACITY);
        Self {
            coordinator,
            observer,
            probe,
            permission: watch::channel(false).0,
            loading: watch::channel(false).0,
            status,
            has_loaded: AtomicBool::new(false),
            observing: AtomicBool::new(false),
            observer_task: Mutex::new(None),
        }
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// The cached contacts ordered by name.
    pub fn contacts(&self) -> watch::Receiver<Vec<Contact>> {
        self.coordinator.cache().observe_all()
    }

    /// One cached contact, for a details view.
    pub fn contact(&self, id: &str) -> impl Stream<Item = Option<Contact>> + Send + 'static {
        self.coordinator.cache().observe(id)
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn permission(&self) -> watch::Receiver<bool> {
        self.permission.subscribe()
    }

    /// Transient messages; each subscriber receives every message sent after
    /// it subscribed, once.
    pub fn status_messages(&self) -> broadcast::Receiver<StatusMessage> {
        self.status.subscribe()
    }

    pub fn is_observing(&self) -> bool {
        self.observing.load(Ordering::SeqCst)
    }

    /// Re-reads the permission and publishes it.
    pub fn check_permission(&self) -> bool {
        let granted = self.probe.has_permission();
        self.permission.send_replace(granted);
        tracing::debug!(granted, "checked contacts permission");
        granted
    }

    /// Loads contacts into the cache for this session.
    ///
    /// The first sync ever, and every forced load, runs with the loading
    /// indicator on and reports its result; other loads sync silently and
    /// report only a failure. Once loaded, device changes are observed.
    #[tracing::instrument(skip(self))]
    pub async fn load_contacts(&self, force_refresh: bool) {
        if !*self.permission.borrow() {
            tracing::debug!("no contacts permission, not loading");
            return;
        }
        if self.coordinator.is_syncing() {
            tracing::debug!("sync in progress, not loading");
            return;
        }
        if !force_refresh && self.has_loaded.load(Ordering::SeqCst) {
            return;
        }

        let never_synced = match self.coordinator.ledger().get().await {
            Ok(last) => last.is_none(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read sync ledger, assuming never synced");
                true
            }
        };

        if force_refresh || never_synced {
            self.load_visibly(force_refresh).await;
        } else {
            self.load_silently().await;
        }

        self.has_loaded.store(true, Ordering::SeqCst);
        self.start_observing();
    }

    async fn load_visibly(&self, force_full: bool) {
        // the indicator belongs to whoever runs the sync
        let Some(claimed) = self.coordinator.try_claim(force_full) else {
            tracing::debug!("sync already in progress, not loading");
            return;
        };
        let _loading = LoadingIndicator::show(&self.loading);
        self.emit(StatusMessage::Syncing);

        match claimed.run().await {
            Ok(_) => self.emit(StatusMessage::Synced),
            Err(e) => {
                tracing::error!(error = %e, "failed to load contacts");
                self.emit(StatusMessage::SyncFailed);
            }
        }
    }

    async fn load_silently(&self) {
        if let Err(e) = self.coordinator.synchronize().await {
            tracing::error!(error = %e, "failed to sync contacts");
            self.emit(StatusMessage::SyncFailed);
        }
    }

    /// Syncs in the background after the app returns to the foreground.
    ///
    /// Failures are only logged.
    #[tracing::instrument(skip(self))]
    pub async fn sync_on_app_resume(&self) {
        if !*self.permission.borrow() || self.coordinator.is_syncing() {
            return;
        }

        match self.coordinator.synchronize().await {
            Ok(SyncOutcome::Completed(report)) if report.has_changes() => {
                self.emit(StatusMessage::Updated);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "resume sync failed"),
        }
    }

    /// Stops observing device changes. The subscription is released once
    /// this returns.
    pub async fn close(&self) {
        let task = lock(&self.observer_task).take();
        if let Some(task) = task {
            task.abort();
            // the stream, and with it the subscription, is dropped with the task
            let _ = task.await;
            tracing::debug!("stopped observing device changes");
        }
        self.observing.store(false, Ordering::SeqCst);
    }

    fn start_observing(&self) {
        if !*self.permission.borrow() || self.observing.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut changes = self.observer.observe_changes();
        let coordinator = self.coordinator.clone();
        let status = self.status.clone();
        let task = tokio::spawn(
            async move {
                while changes.next().await.is_some() {
                    let conflated = changes.drain_pending();
                    tracing::debug!(conflated, "device contacts changed");

                    let Some(claimed) = coordinator.try_claim(false) else {
                        tracing::debug!("sync already in progress, ignoring change");
                        continue;
                    };
                    let _ = status.send(StatusMessage::Syncing);
                    match claimed.run().await {
                        Ok(_) => {
                            let _ = status.send(StatusMessage::ChangesSynced);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "sync after device change failed");
                            let _ = status.send(StatusMessage::ChangesSyncFailed);
                        }
                    }
                }
            }
            .in_current_span(),
        );
        *lock(&self.observer_task) = Some(task);
    }

    fn emit(&self, message: StatusMessage) {
        // no subscriber means nobody is there to show it
        let _ = self.status.send(message);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.observer_task).take() {
            task.abort();
        }
    }
}

/// Shows the loading indicator until dropped.
struct LoadingIndicator<'a> {
    loading: &'a watch::Sender<bool>,
}

impl<'a> LoadingIndicator<'a> {
    fn show(loading: &'a watch::Sender<bool>) -> Self {
        loading.send_replace(true);
        Self { loading }
    }
}

impl Drop for LoadingIndicator<'_> {
    fn drop(&mut self) {
        self.loading.send_replace(false);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
