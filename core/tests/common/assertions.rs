// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Custom assertion helpers for integration tests.

use contactsync_core::{Contact, ContactSync, StatusMessage};
use tokio::sync::broadcast;

/// Asserts that the cache holds exactly the given ids.
///
/// # Panics
///
/// Panics if the ids differ or the cache cannot be read.
pub async fn assert_cached_ids(app: &ContactSync, expected: &[&str]) {
    let mut ids: Vec<String> = app
        .cache()
        .all_ids()
        .await
        .expect("Failed to read cached ids")
        .into_iter()
        .collect();
    ids.sort();

    let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    expected.sort();

    assert_eq!(ids, expected, "Cached ids mismatch");
}

/// Asserts the names of a contact list, in order.
pub fn assert_names(contacts: &[Contact], expected: &[&str]) {
    let names: Vec<&str> = contacts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, expected, "Contact names mismatch");
}

/// Collects every status message already queued for `rx`.
pub fn drain_messages(rx: &mut broadcast::Receiver<StatusMessage>) -> Vec<StatusMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}
