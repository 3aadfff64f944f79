// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Session workflow tests: initial load, resume and live observation.

use std::sync::Arc;

use contactsync_core::StatusMessage;
use contactsync_core::device::MemoryDevice;
use futures::StreamExt;

use crate::common::{assert_cached_ids, drain_messages, open_app, with_phone};

#[tokio::test]
async fn first_session_loads_visibly_and_later_sessions_silently() {
    // Arrange
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;

    // Act: first session ever
    let first = app.session();
    let mut messages = first.status_messages();
    first.check_permission();
    first.load_contacts(false).await;
    first.close().await;

    // Assert
    assert_eq!(
        drain_messages(&mut messages),
        vec![StatusMessage::Syncing, StatusMessage::Synced]
    );

    // Act: a later session of the same install
    let second = app.session();
    let mut messages = second.status_messages();
    second.check_permission();
    second.load_contacts(false).await;

    // Assert
    assert!(drain_messages(&mut messages).is_empty());
    assert!(second.is_observing());
    second.close().await;
}

#[tokio::test]
async fn silent_load_reports_failures() {
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    app.coordinator().synchronize().await.unwrap();

    let session = app.session();
    let mut messages = session.status_messages();
    let mut loading = session.loading();
    session.check_permission();
    device.fail_next_queries(1);
    session.load_contacts(false).await;

    assert_eq!(drain_messages(&mut messages), vec![StatusMessage::SyncFailed]);
    assert!(!loading.has_changed().unwrap(), "silent loads never show loading");
    assert_cached_ids(&app, &["1"]).await;
    session.close().await;
}

#[tokio::test]
async fn live_changes_are_synced_and_reported() {
    // Arrange
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    let session = app.session();
    session.check_permission();
    session.load_contacts(false).await;
    let mut messages = session.status_messages();
    let mut details = Box::pin(session.contact("2"));
    assert_eq!(details.next().await, Some(None));

    // Act
    device.upsert(with_phone("2", "John"));

    // Assert
    let john = details.next().await.unwrap().expect("contact synced");
    assert_eq!(john.name, "John");
    assert_eq!(messages.recv().await.unwrap(), StatusMessage::Syncing);
    assert_eq!(messages.recv().await.unwrap(), StatusMessage::ChangesSynced);
    session.close().await;
}

#[tokio::test]
async fn live_sync_failures_are_reported() {
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    let session = app.session();
    session.check_permission();
    session.load_contacts(false).await;
    let mut messages = session.status_messages();

    device.revoke_permission();
    device.remove("1");

    assert_eq!(messages.recv().await.unwrap(), StatusMessage::Syncing);
    assert_eq!(
        messages.recv().await.unwrap(),
        StatusMessage::ChangesSyncFailed
    );
    assert_cached_ids(&app, &["1"]).await;
    session.close().await;
}

#[tokio::test]
async fn closing_the_session_unregisters_the_observer() {
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    let session = app.session();
    session.check_permission();
    session.load_contacts(false).await;
    assert_eq!(device.observer_count(), 1);

    session.close().await;

    assert_eq!(device.observer_count(), 0);
    device.upsert(with_phone("2", "John"));
    assert_cached_ids(&app, &["1"]).await;
}

#[tokio::test]
async fn dropping_the_session_unregisters_the_observer() {
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    let session = app.session();
    session.check_permission();
    session.load_contacts(false).await;

    drop(session);
    // let the aborted task unwind
    for _ in 0..10 {
        if device.observer_count() == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert_eq!(device.observer_count(), 0);
}
