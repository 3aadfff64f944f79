// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Keeps a local cache of the device contact store in sync.
//!
//! The [`SyncCoordinator`] reconciles the device store, read through a
//! [`ContactReader`], into a SQLite-backed [`ContactCache`], using a
//! [`SyncLedger`] to choose between full and incremental syncs. A
//! [`SessionController`] drives the coordinator for one app session.

mod cache;
mod config;
mod contact;
mod contact_sync;
mod coordinator;
pub mod device;
mod format;
mod ledger;
mod localdb;
mod observer;
mod session;
mod settings;
mod source;

pub use crate::cache::{CacheError, ContactCache};
pub use crate::config::{APP_NAME, Config, expand_path, get_config_dir};
pub use crate::contact::{
    Address, AddressType, Contact, Email, EmailType, PhoneNumber, PhoneType,
};
pub use crate::contact_sync::{ContactSync, SyncStatus};
pub use crate::coordinator::{
    ClaimedSync, Clock, SyncCoordinator, SyncError, SyncMode, SyncOutcome, SyncReport, SyncState,
};
pub use crate::format::format_phone_number;
pub use crate::ledger::{LedgerError, SyncLedger};
pub use crate::localdb::LocalDb;
pub use crate::observer::{ChangeObserver, ChangeStream};
pub use crate::session::{SessionController, StatusMessage};
pub use crate::settings::{JsonFileSettings, MemorySettings, SettingsError, SettingsStore};
pub use crate::source::ContactReader;
