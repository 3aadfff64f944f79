// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::device::{
    ChangeCallback, ChangeNotifier, DeviceSource, Filter, PermissionProbe, Query, Row, Sort,
    SourceError, SubscriptionId, Table, Value, columns,
};
use crate::{Address, Email, PhoneNumber};

/// A contact as stored on the device, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceContact {
    /// Row id.
    pub id: String,

    /// Display name, absent for unnamed contacts.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Starred flag.
    #[serde(default)]
    pub starred: bool,

    /// Last modification instant, epoch milliseconds.
    #[serde(default)]
    pub last_updated: i64,

    /// Raw phone numbers.
    #[serde(default)]
    pub phones: Vec<PhoneNumber>,

    /// Email addresses.
    #[serde(default)]
    pub emails: Vec<Email>,

    /// Postal addresses.
    #[serde(default)]
    pub addresses: Vec<Address>,
}

impl DeviceContact {
    /// Creates a named contact without details.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: Some(display_name.into()),
            starred: false,
            last_updated: 0,
            phones: Vec::new(),
            emails: Vec::new(),
            addresses: Vec::new(),
        }
    }

    /// Creates a contact without a display name.
    pub fn unnamed(id: impl Into<String>) -> Self {
        Self {
            display_name: None,
            ..Self::new(id, "")
        }
    }

    /// Adds a phone number.
    pub fn phone(mut self, number: &str, kind: crate::PhoneType) -> Self {
        self.phones.push(PhoneNumber {
            number: number.to_string(),
            kind,
        });
        self
    }

    /// Adds an email address.
    pub fn email(mut self, address: &str, kind: crate::EmailType) -> Self {
        self.emails.push(Email {
            address: address.to_string(),
            kind,
        });
        self
    }

    /// Adds a postal address.
    pub fn address(mut self, address: &str, kind: crate::AddressType) -> Self {
        self.addresses.push(Address {
            address: address.to_string(),
            kind,
        });
        self
    }

    /// Marks the contact as starred.
    pub fn starred(mut self) -> Self {
        self.starred = true;
        self
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    contacts: Vec<DeviceContact>,
}

/// An in-memory device contact store.
///
/// Every mutation stamps the contact with a fresh, strictly increasing
/// last-updated instant and notifies all registered observers. Useful as the
/// device for tests and for driving a session from a JSON snapshot.
pub struct MemoryDevice {
    contacts: Mutex<Vec<DeviceContact>>,
    observers: Mutex<HashMap<SubscriptionId, ChangeCallback>>,
    queries: Mutex<Vec<Query>>,
    next_subscription: AtomicU64,
    last_tick: AtomicU64,
    permission: AtomicBool,
    pending_failures: AtomicUsize,
}

impl fmt::Debug for MemoryDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDevice")
            .field("contacts", &lock(&self.contacts).len())
            .field("observers", &lock(&self.observers).len())
            .field("permission", &self.permission.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDevice {
    /// Creates an empty store with the read permission granted.
    pub fn new() -> Self {
        Self {
            contacts: Mutex::new(Vec::new()),
            observers: Mutex::new(HashMap::new()),
            queries: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            last_tick: AtomicU64::new(0),
            permission: AtomicBool::new(true),
            pending_failures: AtomicUsize::new(0),
        }
    }

    /// Creates a store holding the given contacts, without notifying anyone.
    pub fn with_contacts(contacts: impl IntoIterator<Item = DeviceContact>) -> Self {
        let device = Self::new();
        {
            let mut guard = lock(&device.contacts);
            for mut contact in contacts {
                if contact.last_updated == 0 {
                    contact.last_updated = device.tick().as_millisecond();
                }
                guard.push(contact);
            }
        }
        device
    }

    /// Loads a JSON snapshot of the form `{"contacts": [...]}`.
    ///
    /// A missing file yields an empty store.
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                let snapshot: Snapshot = serde_json::from_str(&content)
                    .map_err(|e| format!("Failed to parse device snapshot: {e}"))?;
                tracing::debug!(path = %path.display(), count = snapshot.contacts.len(), "loaded device snapshot");
                Ok(Self::with_contacts(snapshot.contacts))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "device snapshot not found, starting empty");
                Ok(Self::new())
            }
            Err(e) => Err(format!("Failed to read device snapshot {}: {e}", path.display()).into()),
        }
    }

    /// Writes the current contacts as a JSON snapshot.
    pub async fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let snapshot = Snapshot {
            contacts: self.contacts(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(path, json)
            .await
            .map_err(|e| format!("Failed to write device snapshot {}: {e}", path.display()).into())
    }

    /// A strictly increasing instant, never behind the wall clock.
    ///
    /// Mutations are stamped with it, so a sync clock built on it never
    /// collides with a later edit.
    pub fn tick(&self) -> Timestamp {
        let now = Timestamp::now().as_millisecond().max(0) as u64;
        let mut prev = self.last_tick.load(Ordering::SeqCst);
        loop {
            let next = now.max(prev + 1);
            match self
                .last_tick
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return Timestamp::from_millisecond(next as i64).unwrap_or(Timestamp::MAX),
                Err(actual) => prev = actual,
            }
        }
    }

    /// Inserts or replaces a contact by id and notifies observers.
    pub fn upsert(&self, mut contact: DeviceContact) {
        contact.last_updated = self.tick().as_millisecond();
        {
            let mut contacts = lock(&self.contacts);
            match contacts.iter_mut().find(|c| c.id == contact.id) {
                Some(existing) => *existing = contact,
                None => contacts.push(contact),
            }
        }
        self.notify();
    }

    /// Applies an edit to an existing contact and notifies observers.
    ///
    /// Returns `false` when the contact does not exist.
    pub fn update(&self, id: &str, edit: impl FnOnce(&mut DeviceContact)) -> bool {
        let stamp = self.tick().as_millisecond();
        let found = {
            let mut contacts = lock(&self.contacts);
            match contacts.iter_mut().find(|c| c.id == id) {
                Some(contact) => {
                    edit(contact);
                    contact.last_updated = stamp;
                    true
                }
                None => false,
            }
        };
        if found {
            self.notify();
        }
        found
    }

    /// Removes a contact and notifies observers.
    pub fn remove(&self, id: &str) -> bool {
        let removed = {
            let mut contacts = lock(&self.contacts);
            let before = contacts.len();
            contacts.retain(|c| c.id != id);
            contacts.len() != before
        };
        if removed {
            self.notify();
        }
        removed
    }

    /// A copy of all contacts.
    pub fn contacts(&self) -> Vec<DeviceContact> {
        lock(&self.contacts).clone()
    }

    /// Revokes the read permission; queries fail until it is granted again.
    pub fn revoke_permission(&self) {
        self.permission.store(false, Ordering::SeqCst);
    }

    /// Grants the read permission.
    pub fn grant_permission(&self) {
        self.permission.store(true, Ordering::SeqCst);
    }

    /// Makes the next `n` queries fail with [`SourceError::Unavailable`].
    pub fn fail_next_queries(&self, n: usize) {
        self.pending_failures.store(n, Ordering::SeqCst);
    }

    /// All queries served so far, oldest first.
    pub fn query_log(&self) -> Vec<Query> {
        lock(&self.queries).clone()
    }

    /// Forgets the query log.
    pub fn clear_query_log(&self) {
        lock(&self.queries).clear();
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        lock(&self.observers).len()
    }

    /// Fires every registered observer once, as the platform does on any change.
    pub fn notify(&self) {
        let callbacks: Vec<ChangeCallback> = lock(&self.observers).values().cloned().collect();
        for callback in callbacks {
            callback();
        }
    }

    fn take_failure(&self) -> bool {
        self.pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl DeviceSource for MemoryDevice {
    fn query(&self, query: &Query) -> Result<Option<Vec<Row>>, SourceError> {
        if !self.permission.load(Ordering::SeqCst) {
            return Err(SourceError::PermissionDenied);
        }
        if self.take_failure() {
            return Err(SourceError::Unavailable("injected failure".to_string()));
        }
        lock(&self.queries).push(query.clone());

        let contacts = lock(&self.contacts);
        let rows = match query.table {
            Table::Contacts => {
                let mut selected: Vec<&DeviceContact> = contacts
                    .iter()
                    .filter(|c| match &query.filter {
                        Some(Filter::UpdatedAfter(ts)) => c.last_updated > *ts,
                        Some(Filter::ContactId(id)) => &c.id == id,
                        None => true,
                    })
                    .collect();
                if let Some(Sort::DisplayNameAsc) = query.sort {
                    selected.sort_by_key(|c| c.display_name.as_ref().map(|n| n.to_lowercase()));
                }
                selected
                    .into_iter()
                    .map(|c| contact_row(c, query.projection))
                    .collect()
            }
            table => {
                let owner = match &query.filter {
                    Some(Filter::ContactId(id)) => Some(id.as_str()),
                    _ => None,
                };
                contacts
                    .iter()
                    .filter(|c| owner.is_none_or(|id| c.id == id))
                    .flat_map(|c| detail_rows(c, table))
                    .map(|row| project(row, query.projection))
                    .collect()
            }
        };
        Ok(Some(rows))
    }
}

impl ChangeNotifier for MemoryDevice {
    fn register(&self, callback: ChangeCallback) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        lock(&self.observers).insert(id, callback);
        tracing::trace!(id, "registered change observer");
        id
    }

    fn unregister(&self, id: SubscriptionId) {
        lock(&self.observers).remove(&id);
        tracing::trace!(id, "unregistered change observer");
    }
}

impl PermissionProbe for MemoryDevice {
    fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }
}

fn contact_row(contact: &DeviceContact, projection: &[&'static str]) -> Row {
    let row = Row::new()
        .with(columns::ID, Value::Text(contact.id.clone()))
        .with(
            columns::DISPLAY_NAME,
            match &contact.display_name {
                Some(name) => Value::Text(name.clone()),
                None => Value::Null,
            },
        )
        .with(columns::STARRED, Value::Integer(contact.starred.into()))
        .with(columns::LAST_UPDATED, Value::Integer(contact.last_updated));
    project(row, projection)
}

fn detail_rows(contact: &DeviceContact, table: Table) -> Vec<Row> {
    let detail = |data: &str, code: i64| {
        Row::new()
            .with(columns::CONTACT_ID, Value::Text(contact.id.clone()))
            .with(columns::DATA, Value::Text(data.to_string()))
            .with(columns::TYPE, Value::Integer(code))
    };
    match table {
        Table::Phones => contact
            .phones
            .iter()
            .map(|p| detail(&p.number, p.kind.code()))
            .collect(),
        Table::Emails => contact
            .emails
            .iter()
            .map(|e| detail(&e.address, e.kind.code()))
            .collect(),
        Table::PostalAddresses => contact
            .addresses
            .iter()
            .map(|a| detail(&a.address, a.kind.code()))
            .collect(),
        Table::Contacts => Vec::new(),
    }
}

fn project(row: Row, projection: &[&'static str]) -> Row {
    projection.iter().fold(Row::new(), |acc, &column| {
        acc.with(column, row.value(column).cloned().unwrap_or(Value::Null))
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A poisoned lock only means another thread panicked mid-update of plain data.
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
