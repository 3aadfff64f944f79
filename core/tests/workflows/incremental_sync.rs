// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Incremental sync workflow tests.

use std::sync::Arc;

use contactsync_core::device::{DeviceContact, MemoryDevice, Table};
use contactsync_core::{PhoneType, SyncMode, SyncOutcome, SyncReport};

use crate::common::{assert_cached_ids, open_app, with_phone};

fn report(outcome: SyncOutcome) -> SyncReport {
    match outcome {
        SyncOutcome::Completed(report) => report,
        SyncOutcome::Skipped => panic!("sync was skipped"),
    }
}

#[tokio::test]
async fn empty_ledger_selects_full_then_incremental() {
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    assert_eq!(app.ledger().get().await.unwrap(), None);

    let first = report(app.coordinator().synchronize().await.unwrap());
    let second = report(app.coordinator().synchronize().await.unwrap());

    assert_eq!(first.mode, SyncMode::Full);
    assert_eq!(second.mode, SyncMode::Incremental);
}

#[tokio::test]
async fn incremental_sync_detects_deletions() {
    // Arrange: cache {A, B}
    let device = Arc::new(MemoryDevice::with_contacts([
        with_phone("a", "A"),
        with_phone("b", "B"),
    ]));
    let app = open_app(&device).await;
    app.coordinator().synchronize().await.unwrap();
    assert_cached_ids(&app, &["a", "b"]).await;

    // Act: device {A}
    device.remove("b");
    let report = report(app.coordinator().synchronize().await.unwrap());

    // Assert
    assert_eq!(report.mode, SyncMode::Incremental);
    assert_eq!(report.deleted, 1);
    assert_cached_ids(&app, &["a"]).await;
}

#[tokio::test]
async fn incremental_sync_merges_edits_and_additions() {
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    app.coordinator().synchronize().await.unwrap();

    device.update("1", |c| {
        c.display_name = Some("Jane Doe".to_string());
        c.starred = true;
    });
    device.upsert(with_phone("2", "John"));
    let report = report(app.coordinator().synchronize().await.unwrap());

    assert_eq!(report.upserted, 2);
    let jane = app.get_contact("1").await.unwrap().unwrap();
    assert_eq!(jane.name, "Jane Doe");
    assert!(jane.is_favorite);
    assert_cached_ids(&app, &["1", "2"]).await;
}

#[tokio::test]
async fn contact_losing_its_phone_is_kept_until_removed_from_device() {
    // an edit that drops the last phone makes the contact unreadable, but it is
    // still on the device, so it is neither refreshed nor deleted
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    app.coordinator().synchronize().await.unwrap();

    device.update("1", |c| c.phones.clear());
    let report = report(app.coordinator().synchronize().await.unwrap());

    assert_eq!(report.upserted, 0);
    assert_eq!(report.deleted, 0);
    assert_cached_ids(&app, &["1"]).await;
}

#[tokio::test]
async fn incremental_sync_reads_details_only_for_changed_contacts() {
    let device = Arc::new(MemoryDevice::with_contacts([
        with_phone("1", "Jane"),
        with_phone("2", "John"),
        with_phone("3", "Joan"),
    ]));
    let app = open_app(&device).await;
    app.coordinator().synchronize().await.unwrap();
    device.clear_query_log();

    device.update("2", |c| {
        c.phones[0].number = "5559990000".to_string();
        c.phones[0].kind = PhoneType::Work;
    });
    app.coordinator().synchronize().await.unwrap();

    let detail_queries = device
        .query_log()
        .into_iter()
        .filter(|q| q.table != Table::Contacts)
        .count();
    // phones, emails and addresses of the one changed contact
    assert_eq!(detail_queries, 3);
    let john = app.get_contact("2").await.unwrap().unwrap();
    assert_eq!(john.phone_number, "(555) 999-0000");
}

#[tokio::test]
async fn failed_incremental_sync_is_retried_from_the_same_timestamp() {
    // Arrange
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    app.coordinator().synchronize().await.unwrap();
    let before = app.ledger().get().await.unwrap();
    device.upsert(DeviceContact::new("2", "John").phone("5550000000", PhoneType::Home));

    // Act
    device.fail_next_queries(1);
    assert!(app.coordinator().synchronize().await.is_err());
    let after_failure = app.ledger().get().await.unwrap();
    let retry = report(app.coordinator().synchronize().await.unwrap());

    // Assert
    assert_eq!(after_failure, before);
    assert_eq!(retry.mode, SyncMode::Incremental);
    assert_eq!(retry.upserted, 1);
    assert_cached_ids(&app, &["1", "2"]).await;
}
