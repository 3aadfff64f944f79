// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The reactive contact cache on top of the local database.

use std::collections::HashSet;
use std::sync::Arc;

use futures::Stream;
use futures::stream;
use tokio::sync::{Mutex, watch};

use crate::Contact;
use crate::localdb::{ContactRecord, LocalDb};

/// Errors raised by the contact cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The database rejected a statement.
    #[error("cache database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Nested contact details could not be encoded or decoded.
    #[error("failed to encode contact details: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The structured local mirror of the device contacts.
///
/// Mutations are serialized and each runs in its own transaction. The list
/// published to [`ContactCache::observe_all`] is reloaded after every commit,
/// so observers only ever see committed state. A failed reload does not fail
/// the committed write.
#[derive(Debug, Clone)]
pub struct ContactCache {
    db: LocalDb,
    published: Arc<watch::Sender<Vec<Contact>>>,
    write_lock: Arc<Mutex<()>>,
}

impl ContactCache {
    /// Wraps an opened database, publishing its current content.
    pub async fn new(db: LocalDb) -> Result<Self, CacheError> {
        let initial = load_all(&db).await?;
        tracing::debug!(count = initial.len(), "contact cache ready");
        let (published, _) = watch::channel(initial);
        Ok(Self {
            db,
            published: Arc::new(published),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// The full contact list ordered by name, updated after every mutation.
    pub fn observe_all(&self) -> watch::Receiver<Vec<Contact>> {
        self.published.subscribe()
    }

    /// A single contact, re-emitted whenever it changes; `None` while absent.
    pub fn observe(&self, id: &str) -> impl Stream<Item = Option<Contact>> + Send + 'static {
        let rx = self.published.subscribe();
        let last: Option<Option<Contact>> = None;
        stream::unfold((rx, id.to_string(), last), |(mut rx, id, last)| async move {
            let mut last = last;
            loop {
                let current = rx.borrow_and_update().iter().find(|c| c.id == id).cloned();
                if last.as_ref() != Some(&current) {
                    last = Some(current.clone());
                    return Some((current, (rx, id, last)));
                }
                rx.changed().await.ok()?;
            }
        })
    }

    pub async fn list(&self) -> Result<Vec<Contact>, CacheError> {
        load_all(&self.db).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Contact>, CacheError> {
        match self.db.contacts.get(id).await? {
            Some(record) => Ok(Some(record.into_contact()?)),
            None => Ok(None),
        }
    }

    pub async fn count(&self) -> Result<usize, CacheError> {
        Ok(self.db.contacts.count().await?.max(0) as usize)
    }

    pub async fn has_cached(&self) -> Result<bool, CacheError> {
        Ok(self.count().await? > 0)
    }

    pub async fn all_ids(&self) -> Result<HashSet<String>, CacheError> {
        Ok(self.db.contacts.all_ids().await?)
    }

    /// Makes the cache hold exactly `contacts`, atomically. Returns the number
    /// of rows removed.
    pub async fn replace_all(&self, contacts: &[Contact]) -> Result<u64, CacheError> {
        let records = encode(contacts)?;
        let _guard = self.write_lock.lock().await;
        let removed = self.db.contacts.replace_all(&records).await?;
        tracing::debug!(written = records.len(), removed, "replaced cached contacts");
        self.publish().await;
        Ok(removed)
    }

    /// Inserts or overwrites `contacts`. Never deletes.
    pub async fn upsert(&self, contacts: &[Contact]) -> Result<(), CacheError> {
        if contacts.is_empty() {
            return Ok(());
        }
        let records = encode(contacts)?;
        let _guard = self.write_lock.lock().await;
        self.db.contacts.upsert(&records).await?;
        tracing::debug!(written = records.len(), "upserted cached contacts");
        self.publish().await;
        Ok(())
    }

    /// Deletes every contact whose id is not in `ids`.
    pub async fn delete_except(&self, ids: &HashSet<String>) -> Result<u64, CacheError> {
        let _guard = self.write_lock.lock().await;
        let removed = self.db.contacts.delete_except(ids).await?;
        self.publish_if_changed(removed).await;
        Ok(removed)
    }

    /// Deletes the contacts listed in `ids`.
    pub async fn delete_by_ids(&self, ids: &HashSet<String>) -> Result<u64, CacheError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;
        let removed = self.db.contacts.delete_by_ids(ids).await?;
        self.publish_if_changed(removed).await;
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<u64, CacheError> {
        let _guard = self.write_lock.lock().await;
        let removed = self.db.contacts.clear().await?;
        self.publish_if_changed(removed).await;
        Ok(removed)
    }

    async fn publish_if_changed(&self, removed: u64) {
        if removed > 0 {
            tracing::debug!(removed, "deleted cached contacts");
            self.publish().await;
        }
    }

    /// Reloads the list for observers. The write is already committed, so a
    /// failed reload keeps the previous list until the next commit.
    async fn publish(&self) {
        match load_all(&self.db).await {
            Ok(contacts) => {
                self.published.send_replace(contacts);
            }
            Err(e) => tracing::warn!(error = %e, "failed to reload contacts after commit"),
        }
    }
}

async fn load_all(db: &LocalDb) -> Result<Vec<Contact>, CacheError> {
    db.contacts
        .list()
        .await?
        .into_iter()
        .map(|record| record.into_contact().map_err(CacheError::from))
        .collect()
}

fn encode(contacts: &[Contact]) -> Result<Vec<ContactRecord>, CacheError> {
    contacts
        .iter()
        .map(|c| ContactRecord::from_contact(c).map_err(CacheError::from))
        .collect()
}
