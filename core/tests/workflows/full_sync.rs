// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Full sync workflow tests.

use std::sync::Arc;

use contactsync_core::device::{DeviceContact, MemoryDevice};
use contactsync_core::{
    AddressType, EmailType, PhoneType, SyncError, SyncMode, SyncOutcome, SyncReport,
};

use crate::common::{assert_cached_ids, assert_names, open_app, sample_device, with_phone};

#[tokio::test]
async fn full_sync_keeps_only_named_contacts_with_phones() {
    // Arrange
    let device = sample_device();
    let app = open_app(&device).await;

    // Act
    let outcome = app.coordinator().synchronize().await.unwrap();

    // Assert
    assert_eq!(
        outcome,
        SyncOutcome::Completed(SyncReport {
            mode: SyncMode::Full,
            upserted: 1,
            deleted: 0,
        })
    );
    assert_cached_ids(&app, &["a"]).await;
}

#[tokio::test]
async fn full_sync_stores_normalized_details() {
    // Arrange
    let device = Arc::new(MemoryDevice::with_contacts([DeviceContact::new(
        "1", "Jane Doe",
    )
    .starred()
    .phone(" 555-123-4567 ", PhoneType::Mobile)
    .phone("+15550001111", PhoneType::Work)
    .phone("12345", PhoneType::Other)
    .email("jane@sample.com", EmailType::Personal)
    .address("1234 Sample Street", AddressType::Home)]));
    let app = open_app(&device).await;

    // Act
    app.coordinator().synchronize().await.unwrap();

    // Assert
    let jane = app.get_contact("1").await.unwrap().expect("contact cached");
    assert!(jane.is_favorite);
    assert_eq!(jane.phone_number, "(555) 123-4567");
    let numbers: Vec<_> = jane.phone_numbers.iter().map(|p| p.number.as_str()).collect();
    assert_eq!(numbers, vec!["(555) 123-4567", "+15550001111", "12345"]);
    assert_eq!(jane.emails[0].kind, EmailType::Personal);
    assert_eq!(jane.addresses[0].kind, AddressType::Home);
}

#[tokio::test]
async fn full_sync_lists_contacts_by_name() {
    let device = Arc::new(MemoryDevice::with_contacts([
        with_phone("1", "charlie"),
        with_phone("2", "Alice"),
        with_phone("3", "bob"),
    ]));
    let app = open_app(&device).await;

    app.coordinator().synchronize().await.unwrap();

    assert_names(&app.list_contacts().await.unwrap(), &["Alice", "bob", "charlie"]);
    assert_names(
        &app.cache().observe_all().borrow(),
        &["Alice", "bob", "charlie"],
    );
}

#[tokio::test]
async fn two_syncs_without_changes_are_idempotent() {
    // Arrange
    let device = Arc::new(MemoryDevice::with_contacts([
        with_phone("1", "Jane"),
        with_phone("2", "John"),
    ]));
    let app = open_app(&device).await;

    // Act
    app.coordinator().synchronize().await.unwrap();
    let first = app.list_contacts().await.unwrap();
    app.coordinator().synchronize().await.unwrap();
    let second = app.list_contacts().await.unwrap();

    // Assert
    assert_eq!(first, second);
}

#[tokio::test]
async fn forced_full_sync_replaces_the_cache() {
    let device = Arc::new(MemoryDevice::with_contacts([
        with_phone("1", "Jane"),
        with_phone("2", "John"),
    ]));
    let app = open_app(&device).await;
    app.coordinator().synchronize().await.unwrap();

    device.remove("2");
    let outcome = app.coordinator().force_full_sync().await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Completed(SyncReport {
            mode: SyncMode::Full,
            upserted: 1,
            deleted: 1,
        })
    );
    assert_cached_ids(&app, &["1"]).await;
}

#[tokio::test]
async fn empty_device_clears_the_cache_on_full_sync() {
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    app.coordinator().synchronize().await.unwrap();

    device.remove("1");
    app.coordinator().force_full_sync().await.unwrap();

    assert_cached_ids(&app, &[]).await;
}

#[tokio::test]
async fn revoked_permission_fails_without_wiping_the_cache() {
    // Arrange
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app(&device).await;
    app.coordinator().synchronize().await.unwrap();
    let before = app.ledger().get().await.unwrap();

    // Act
    device.revoke_permission();
    let result = app.coordinator().force_full_sync().await;

    // Assert
    assert!(matches!(result, Err(SyncError::Read(_))));
    assert_cached_ids(&app, &["1"]).await;
    assert_eq!(app.ledger().get().await.unwrap(), before);
}
