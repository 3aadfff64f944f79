// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Test data factories for integration tests.

use std::path::Path;
use std::sync::Arc;

use contactsync_core::device::{DeviceContact, MemoryDevice};
use contactsync_core::{Config, ContactSync, PhoneType};

/// Creates a configuration keeping all state under `state_dir`.
#[must_use]
pub fn test_config(state_dir: &Path) -> Config {
    Config {
        state_dir: Some(state_dir.to_path_buf()),
        device_path: None,
    }
}

/// A named device contact with one mobile number.
#[must_use]
pub fn with_phone(id: &str, name: &str) -> DeviceContact {
    DeviceContact::new(id, name).phone("5551234567", PhoneType::Mobile)
}

/// A device holding `A` (with phone), `B` (without phone) and an unnamed `C`
/// with a phone.
#[must_use]
pub fn sample_device() -> Arc<MemoryDevice> {
    Arc::new(MemoryDevice::with_contacts([
        with_phone("a", "A"),
        DeviceContact::new("b", "B"),
        DeviceContact::unnamed("c").phone("5550000000", PhoneType::Home),
    ]))
}

/// Opens an in-memory app over `device`.
///
/// Syncs are stamped with the device's own clock, so an edit made right after
/// a sync is always seen as newer than it.
pub async fn open_app(device: &Arc<MemoryDevice>) -> ContactSync {
    let app = ContactSync::in_memory(device.clone().into())
        .await
        .expect("Failed to open app");
    with_device_clock(app, device)
}

/// Opens an app persisting its state as configured.
pub async fn open_app_with_config(device: &Arc<MemoryDevice>, config: Config) -> ContactSync {
    let app = ContactSync::new(config, device.clone().into())
        .await
        .expect("Failed to open app");
    with_device_clock(app, device)
}

fn with_device_clock(app: ContactSync, device: &Arc<MemoryDevice>) -> ContactSync {
    let clock = device.clone();
    app.with_clock(Arc::new(move || clock.tick()))
}
