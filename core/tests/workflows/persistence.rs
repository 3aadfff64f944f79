// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Workflows spanning process restarts, driven through an on-disk state
//! directory.

use std::sync::Arc;

use contactsync_core::device::MemoryDevice;
use contactsync_core::{Config, SyncMode, SyncOutcome};

use crate::common::{assert_cached_ids, open_app_with_config, setup_temp_dirs, test_config, with_phone};

#[tokio::test]
async fn restart_keeps_cache_and_ledger() {
    // Arrange
    let temp_dirs = setup_temp_dirs().await.unwrap();
    let config = test_config(&temp_dirs.state_dir);
    let device = Arc::new(MemoryDevice::with_contacts([
        with_phone("1", "Jane"),
        with_phone("2", "John"),
    ]));

    let app = open_app_with_config(&device, config.clone()).await;
    app.coordinator().synchronize().await.unwrap();
    let last_sync = app.ledger().get().await.unwrap();
    app.close().await.unwrap();

    // Act
    let reopened = open_app_with_config(&device, config).await;

    // Assert
    assert!(temp_dirs.state_dir.join("contacts.db").exists());
    assert!(temp_dirs.state_dir.join("settings.json").exists());
    assert_cached_ids(&reopened, &["1", "2"]).await;
    assert_eq!(reopened.ledger().get().await.unwrap(), last_sync);
    assert_eq!(reopened.cache().observe_all().borrow().len(), 2);

    let outcome = reopened.coordinator().synchronize().await.unwrap();
    assert!(matches!(
        outcome,
        SyncOutcome::Completed(report) if report.mode == SyncMode::Incremental
    ));
}

#[tokio::test]
async fn restart_picks_up_offline_deletions() {
    let temp_dirs = setup_temp_dirs().await.unwrap();
    let config = test_config(&temp_dirs.state_dir);
    let device = Arc::new(MemoryDevice::with_contacts([
        with_phone("1", "Jane"),
        with_phone("2", "John"),
    ]));
    let app = open_app_with_config(&device, config.clone()).await;
    app.coordinator().synchronize().await.unwrap();
    app.close().await.unwrap();

    device.remove("1");
    let reopened = open_app_with_config(&device, config).await;
    reopened.coordinator().synchronize().await.unwrap();

    assert_cached_ids(&reopened, &["2"]).await;
}

#[tokio::test]
async fn reset_forces_the_next_sync_to_be_full() {
    let temp_dirs = setup_temp_dirs().await.unwrap();
    let device = Arc::new(MemoryDevice::with_contacts([with_phone("1", "Jane")]));
    let app = open_app_with_config(&device, test_config(&temp_dirs.state_dir)).await;
    app.coordinator().synchronize().await.unwrap();

    app.reset().await.unwrap();

    let status = app.status().await.unwrap();
    assert_eq!(status.cached, 0);
    assert_eq!(status.last_sync, None);
    let outcome = app.coordinator().synchronize().await.unwrap();
    assert!(matches!(
        outcome,
        SyncOutcome::Completed(report) if report.mode == SyncMode::Full
    ));
}

#[tokio::test]
async fn device_snapshot_drives_a_sync() {
    // Arrange
    let temp_dirs = setup_temp_dirs().await.unwrap();
    let snapshot = Arc::new(MemoryDevice::with_contacts([
        with_phone("1", "Jane"),
        with_phone("2", "John"),
    ]));
    snapshot.save(&temp_dirs.device_path()).await.unwrap();

    // Act
    let device = Arc::new(MemoryDevice::load(&temp_dirs.device_path()).await.unwrap());
    let config = Config {
        state_dir: Some(temp_dirs.state_dir.clone()),
        device_path: Some(temp_dirs.device_path()),
    };
    let app = open_app_with_config(&device, config).await;
    app.coordinator().synchronize().await.unwrap();

    // Assert
    assert_cached_ids(&app, &["1", "2"]).await;
    assert_eq!(app.status().await.unwrap().cached, 2);
}
