// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Device change notifications as an async stream.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::device::{ChangeNotifier, SubscriptionId};

/// Turns device-level change callbacks into [`ChangeStream`]s.
#[derive(Clone)]
pub struct ChangeObserver {
    notifier: Arc<dyn ChangeNotifier>,
}

impl fmt::Debug for ChangeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeObserver").finish_non_exhaustive()
    }
}

impl ChangeObserver {
    pub fn new(notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self { notifier }
    }

    /// Registers one subscription, held until the returned stream is dropped.
    pub fn observe_changes(&self) -> ChangeStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.notifier.register(Arc::new(move || {
            // the receiver may already be gone while unregistering races a notification
            let _ = tx.send(());
        }));
        tracing::debug!(subscription = id, "observing device contact changes");
        ChangeStream {
            rx,
            id,
            notifier: self.notifier.clone(),
        }
    }
}

/// A stream yielding one `()` per device change notification.
///
/// Delivery is best effort: ticks carry no payload and may be conflated by the
/// consumer with [`ChangeStream::drain_pending`].
pub struct ChangeStream {
    rx: mpsc::UnboundedReceiver<()>,
    id: SubscriptionId,
    notifier: Arc<dyn ChangeNotifier>,
}

impl fmt::Debug for ChangeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeStream")
            .field("subscription", &self.id)
            .finish_non_exhaustive()
    }
}

impl ChangeStream {
    /// Discards ticks already queued, returning how many were dropped.
    pub fn drain_pending(&mut self) -> usize {
        let mut drained = 0;
        while self.rx.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }
}

impl Stream for ChangeStream {
    type Item = ();

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<()>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ChangeStream {
    fn drop(&mut self) {
        self.notifier.unregister(self.id);
        tracing::debug!(subscription = self.id, "stopped observing device contact changes");
    }
}
