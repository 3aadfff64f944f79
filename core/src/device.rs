// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The query interface of the device contact store.
//!
//! The device store is modelled after a content provider: rows are fetched from
//! a [`Table`] with a projection, an optional [`Filter`] and an optional
//! [`Sort`]. Change notifications are delivered through a register/unregister
//! pair on [`ChangeNotifier`].

mod memory;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use crate::device::memory::{DeviceContact, MemoryDevice};

/// Column names understood by the device store.
pub mod columns {
    /// Row id of a contact.
    pub const ID: &str = "_id";
    /// Display name of a contact, may be null.
    pub const DISPLAY_NAME: &str = "display_name";
    /// Starred flag of a contact, `0` or `1`.
    pub const STARRED: &str = "starred";
    /// Last modification instant of a contact, epoch milliseconds.
    pub const LAST_UPDATED: &str = "contact_last_updated_timestamp";
    /// Owning contact of a detail row.
    pub const CONTACT_ID: &str = "contact_id";
    /// Payload of a detail row: the number, the email address or the formatted address.
    pub const DATA: &str = "data1";
    /// Type code of a detail row.
    pub const TYPE: &str = "data2";
}

/// Row sets exposed by the device store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// One row per contact.
    Contacts,
    /// Phone numbers.
    Phones,
    /// Email addresses.
    Emails,
    /// Postal addresses.
    PostalAddresses,
}

/// Selection predicate of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Contacts whose last-updated column is strictly after the instant, in epoch milliseconds.
    UpdatedAfter(i64),
    /// Detail rows owned by the given contact.
    ContactId(String),
}

/// Sort order of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    /// Display name, case-insensitive ascending.
    DisplayNameAsc,
}

/// A query against the device store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The row set to read.
    pub table: Table,
    /// Columns to return.
    pub projection: &'static [&'static str],
    /// Optional selection predicate.
    pub filter: Option<Filter>,
    /// Optional sort order.
    pub sort: Option<Sort>,
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// SQL-like null.
    Null,
    /// Integer cell.
    Integer(i64),
    /// Text cell.
    Text(String),
}

/// A row returned by the device store, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: HashMap<&'static str, Value>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column, returning the row for chaining.
    pub fn with(mut self, column: &'static str, value: Value) -> Self {
        self.values.insert(column, value);
        self
    }

    /// The raw value of a column, if the row has it.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Reads a column as text. Integers are rendered in decimal.
    pub fn text(&self, column: &str) -> Option<String> {
        match self.values.get(column)? {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Null => None,
        }
    }

    /// Reads a column as an integer. Null and unparsable text read as `0`.
    pub fn integer(&self, column: &str) -> i64 {
        match self.values.get(column) {
            Some(Value::Integer(i)) => *i,
            Some(Value::Text(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Errors raised by the device store.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The app is not allowed to read contacts.
    #[error("permission to read contacts is not granted")]
    PermissionDenied,

    /// The store could not be queried.
    #[error("contact store unavailable: {0}")]
    Unavailable(String),

    /// The background query task failed.
    #[error("contact query task failed: {0}")]
    Task(String),
}

/// Read access to the device contact store.
///
/// Implementations block the calling thread; callers are expected to run
/// queries on a blocking pool. `Ok(None)` means the store returned no cursor,
/// which is treated as an empty result.
pub trait DeviceSource: Send + Sync {
    /// Runs a query.
    fn query(&self, query: &Query) -> Result<Option<Vec<Row>>, SourceError>;
}

/// Identifier of a registered change callback.
pub type SubscriptionId = u64;

/// Callback invoked on every device-level change.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Change notifications of the device contact store.
pub trait ChangeNotifier: Send + Sync {
    /// Registers a callback for changes anywhere under the contacts row sets.
    fn register(&self, callback: ChangeCallback) -> SubscriptionId;

    /// Removes a callback. Unknown ids are ignored.
    fn unregister(&self, id: SubscriptionId);
}

/// Whether the app currently holds the permission to read contacts.
pub trait PermissionProbe: Send + Sync {
    /// Checks the permission.
    fn has_permission(&self) -> bool;
}

/// The three faces of a device contact store, as consumed by a session.
#[derive(Clone)]
pub struct Device {
    /// Query access.
    pub source: Arc<dyn DeviceSource>,
    /// Change notifications.
    pub notifier: Arc<dyn ChangeNotifier>,
    /// Permission checks.
    pub permission: Arc<dyn PermissionProbe>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").finish_non_exhaustive()
    }
}

impl From<Arc<MemoryDevice>> for Device {
    fn from(device: Arc<MemoryDevice>) -> Self {
        Self {
            source: device.clone(),
            notifier: device.clone(),
            permission: device,
        }
    }
}
